//! Page templates.
//!
//! A template is plain HTML with `{{ slot }}` placeholders. Parsing splits
//! the source once into literal text and slot references; rendering walks
//! the segments and asks a lookup for each slot value.
//!
//! ```text
//! <h1>{{ title }}</h1>{{ content }}
//! └──┬─┘└───┬───┘└─┬─┘└────┬────┘
//!  Text   Slot   Text    Slot
//! ```

mod compose;
mod registry;

pub use compose::{Composer, Page, SiteContext, output_relative, page_url};
pub use registry::{TemplateError, TemplateRegistry};

use crate::utils::hash::hex_digest;
use regex::Regex;
use std::sync::LazyLock;

/// Slot that receives the rendered document body.
pub const CONTENT_SLOT: &str = "content";

static SLOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(String),
}

/// A parsed template or partial.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
    digest: String,
}

impl Template {
    pub fn parse(name: impl Into<String>, source: &str) -> Self {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in SLOT_RE.captures_iter(source) {
            let (Some(whole), Some(slot)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Text(source[last..whole.start()].to_owned()));
            }
            segments.push(Segment::Slot(slot.as_str().to_owned()));
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment::Text(source[last..].to_owned()));
        }

        Self {
            name: name.into(),
            segments,
            digest: hex_digest(source.as_bytes()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// BLAKE3 digest of the template source.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn has_slot(&self, slot: &str) -> bool {
        self.slots().any(|s| s == slot)
    }

    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|seg| match seg {
            Segment::Slot(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Fill every slot through `lookup`. Slots the lookup does not know
    /// render as the empty string.
    pub fn render(&self, mut lookup: impl FnMut(&str) -> Option<String>) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(name) => {
                    if let Some(value) = lookup(name) {
                        out.push_str(&value);
                    }
                }
            }
        }
        out
    }
}
