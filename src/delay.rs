//! Pacing between checks.
//!
//! A [`DelaySpec`] comes straight from the config file.  It is resolved once
//! into a [`Delay`], which is then asked for a fresh duration every time the
//! monitor needs to wait.  Two delays exist at runtime (between items and
//! between passes) and each one owns its own random source.
//!
//! Gamma samples are not clamped: the distribution has a long upper tail and
//! an occasional very long pause is expected behaviour.

use std::thread;
use std::time::Duration;

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Gamma};
use serde::Deserialize;
use thiserror::Error;

/// How a delay is configured.  Lengths and scales are in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum DelaySpec {
    Fixed { len: f64 },
    Gamma { k: f64, theta: f64 },
}

#[derive(Debug, Error, PartialEq)]
pub enum InvalidDelay {
    #[error("fixed delay length must be a finite number of seconds >= 0, got {0}")]
    Length(f64),
    #[error("gamma delay needs finite k > 0 and theta > 0, got k={k} theta={theta}")]
    Gamma { k: f64, theta: f64 },
}

impl DelaySpec {
    /// Resolve into a delay with its own entropy-seeded random source.
    pub fn build(&self) -> Result<Delay, InvalidDelay> {
        self.build_with_rng(StdRng::from_entropy())
    }

    fn build_with_rng(&self, rng: StdRng) -> Result<Delay, InvalidDelay> {
        match *self {
            DelaySpec::Fixed { len } => {
                if len < 0.0 {
                    return Err(InvalidDelay::Length(len));
                }
                let len = Duration::try_from_secs_f64(len).map_err(|_| InvalidDelay::Length(len))?;
                Ok(Delay::Fixed(len))
            }
            DelaySpec::Gamma { k, theta } => {
                let valid = k.is_finite() && theta.is_finite() && k > 0.0 && theta > 0.0;
                let dist = Gamma::new(k, theta)
                    .ok()
                    .filter(|_| valid)
                    .ok_or(InvalidDelay::Gamma { k, theta })?;
                Ok(Delay::Gamma { dist, rng })
            }
        }
    }
}

/// A wait point in the polling loop.
pub trait Pause {
    fn pause(&mut self);
}

/// A resolved delay strategy.
#[derive(Debug)]
pub enum Delay {
    Fixed(Duration),
    Gamma { dist: Gamma<f64>, rng: StdRng },
}

impl Delay {
    /// Produce the next duration.
    pub fn gen(&mut self) -> Duration {
        match self {
            Delay::Fixed(len) => *len,
            Delay::Gamma { dist, rng } => {
                let secs = dist.sample(rng);
                // Samples are finite and non-negative; only an astronomically
                // large one can fail the conversion.
                Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
            }
        }
    }

    /// Generate a duration and block the current thread for it.
    pub fn sleep(&mut self) {
        let len = self.gen();
        debug!("sleeping for {:.3} seconds", len.as_secs_f64());
        thread::sleep(len);
    }
}

impl Pause for Delay {
    fn pause(&mut self) {
        self.sleep();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
