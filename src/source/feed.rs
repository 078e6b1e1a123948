//! Feed classification.
//!
//! A concert page's feed is empty until tickets go on sale, after which it
//! carries one `<item>` per show.  [`classify`] turns a raw body into a
//! [`FeedResult`]:
//!
//! * no `<item>` anywhere in the document: [`FeedResult::Closed`]
//! * one or more items: [`FeedResult::Open`] with each item's `<title>`, in
//!   document order
//!
//! Items are matched at any depth, so both plain RSS
//! (`rss > channel > item`) and looser layouts are accepted.  The body must
//! still be well-formed, and every item must carry a non-empty title.
//!
//! This module is pure (no I/O) so it can be exercised directly from tests.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ParseError;

/// What a feed body says about ticket availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedResult {
    Closed,
    /// Titles of the listed items, never empty.
    Open(Vec<String>),
}

/// Parse `body` and report whether it lists any items.
pub fn classify(body: &str) -> Result<FeedResult, ParseError> {
    let mut reader = Reader::from_str(body);
    let mut scan = Scan::default();

    loop {
        let event = reader.read_event().map_err(|e| {
            ParseError::new(format!("at byte {}: {e}", reader.error_position()), body)
        })?;

        match event {
            Event::Start(e) => {
                scan.enter_root(reader.buffer_position(), body)?;
                scan.start(e.name().as_ref());
                scan.depth += 1;
            }
            Event::Empty(e) => {
                scan.enter_root(reader.buffer_position(), body)?;
                scan.start(e.name().as_ref());
                scan.end();
            }
            Event::End(_) => {
                if scan.depth == 0 {
                    return Err(ParseError::new("unmatched closing tag", body));
                }
                scan.depth -= 1;
                scan.end();
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|e| ParseError::new(e.to_string(), body))?;
                if scan.depth == 0 && !text.trim().is_empty() {
                    return Err(ParseError::new("text outside the document element", body));
                }
                scan.text(&text);
            }
            Event::CData(e) => {
                if scan.depth == 0 {
                    return Err(ParseError::new("CDATA outside the document element", body));
                }
                let text = std::str::from_utf8(&e)
                    .map_err(|e| ParseError::new(e.to_string(), body))?;
                scan.text(text);
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes.
            _ => {}
        }
    }

    if !scan.seen_root {
        return Err(ParseError::new("no element found", body));
    }
    if scan.depth != 0 {
        return Err(ParseError::new("unclosed element at end of document", body));
    }

    if scan.titles.is_empty() {
        return Ok(FeedResult::Closed);
    }

    let mut titles = Vec::with_capacity(scan.titles.len());
    for (n, title) in scan.titles.into_iter().enumerate() {
        match title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => titles.push(t.to_string()),
            Some(_) => {
                return Err(ParseError::new(format!("item {} has an empty title", n + 1), body))
            }
            None => return Err(ParseError::new(format!("item {} has no title", n + 1), body)),
        }
    }
    Ok(FeedResult::Open(titles))
}

// ---------------------------------------------------------------------------
// Document walk
// ---------------------------------------------------------------------------

/// An `<item>` whose end tag has not been seen yet.
struct OpenItem {
    depth: usize,
    index: usize,
    has_title: bool,
}

/// The `<title>` currently being read.  Only text before its first child
/// element counts.
struct OpenTitle {
    depth: usize,
    index: usize,
    text: String,
    saw_child: bool,
}

#[derive(Default)]
struct Scan {
    /// Number of currently open elements.
    depth: usize,
    seen_root: bool,
    /// One slot per item in document order; `None` until a title is found.
    titles: Vec<Option<String>>,
    items: Vec<OpenItem>,
    title: Option<OpenTitle>,
}

impl Scan {
    fn enter_root(&mut self, position: impl std::fmt::Display, body: &str) -> Result<(), ParseError> {
        if self.depth == 0 {
            if self.seen_root {
                return Err(ParseError::new(
                    format!("junk after document element at byte {position}"),
                    body,
                ));
            }
            self.seen_root = true;
        }
        Ok(())
    }

    /// Called with `depth` equal to the new element's own depth.
    fn start(&mut self, name: &[u8]) {
        let depth = self.depth;
        if let Some(title) = self.title.as_mut() {
            title.saw_child = true;
        }

        if name == b"item" {
            let index = self.titles.len();
            self.titles.push(None);
            self.items.push(OpenItem {
                depth,
                index,
                has_title: false,
            });
        } else if name == b"title" && self.title.is_none() {
            if let Some(item) = self.items.last_mut() {
                if item.depth + 1 == depth && !item.has_title {
                    item.has_title = true;
                    self.title = Some(OpenTitle {
                        depth,
                        index: item.index,
                        text: String::new(),
                        saw_child: false,
                    });
                }
            }
        }
    }

    /// Called with `depth` equal to the closing element's depth.
    fn end(&mut self) {
        let depth = self.depth;
        if self.title.as_ref().is_some_and(|t| t.depth == depth) {
            if let Some(title) = self.title.take() {
                self.titles[title.index] = Some(title.text);
            }
        }
        if self.items.last().is_some_and(|i| i.depth == depth) {
            self.items.pop();
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(title) = self.title.as_mut() {
            if !title.saw_child {
                title.text.push_str(text);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
