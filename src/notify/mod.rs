//! Push notifications.
//!
//! The monitor talks to a [`Notify`] implementation and never to the gateway
//! directly.  [`WxPusher`] is the production gateway client; a failed send is
//! always returned to the caller, who decides whether it matters.

mod wxpusher;

pub use wxpusher::{WxPusher, DEFAULT_ENDPOINT};

use crate::error::NotifyError;

pub trait Notify {
    /// Deliver `message`.  Exactly one request per call, no retries.
    fn notify(&self, message: &str) -> Result<(), NotifyError>;
}
