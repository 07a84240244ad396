//! Typed front matter values.
//!
//! Front matter may carry arbitrary keys. Values are converted into a small
//! tagged set at load time instead of being coerced later, and the required
//! fields are validated once, here.

use crate::error::DocumentError;
use chrono::{DateTime, NaiveDate};
use std::fmt;

/// A single front matter value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Str(String),
    Date(NaiveDate),
    List(Vec<String>),
    Bool(bool),
    Number(f64),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::List(items) => f.write_str(&items.join(", ")),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Parse a calendar date: `YYYY-MM-DD`, or an RFC 3339 timestamp whose
/// date part is kept.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Ordered key/value front matter, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, MetaValue)>,
}

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert a value, replacing an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            MetaValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn title(&self) -> &str {
        self.get_str("title").unwrap_or_default()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self.get("date")? {
            MetaValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn author(&self) -> Option<&str> {
        self.get_str("author")
    }

    pub fn layout(&self) -> Option<&str> {
        self.get_str("layout").map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn list(&self, key: &str) -> &[String] {
        match self.get(key) {
            Some(MetaValue::List(items)) => items,
            _ => &[],
        }
    }

    pub fn images(&self) -> &[String] {
        self.list("images")
    }

    pub fn tags(&self) -> &[String] {
        self.list("tags")
    }

    pub fn is_draft(&self) -> bool {
        matches!(self.get("draft"), Some(MetaValue::Bool(true)))
    }

    /// Normalize well-known keys and check the required ones.
    ///
    /// - `title`: required, non-empty string
    /// - `date`: required, must parse as a calendar date
    /// - `images`, `tags`: a single string is promoted to a one-item list
    pub fn validate(mut self) -> Result<Self, DocumentError> {
        match self.get("title") {
            None => return Err(DocumentError::MissingRequiredField("title")),
            Some(MetaValue::Str(s)) if s.trim().is_empty() => {
                return Err(DocumentError::MissingRequiredField("title"));
            }
            Some(MetaValue::Str(_)) => {}
            Some(_) => {
                return Err(DocumentError::MalformedMetadata("`title` must be a string".into()));
            }
        }

        let date = match self.get("date") {
            None => return Err(DocumentError::MissingRequiredField("date")),
            Some(MetaValue::Date(d)) => *d,
            Some(MetaValue::Str(s)) => parse_date(s).ok_or_else(|| {
                DocumentError::MalformedMetadata(format!("`date` is not a calendar date: {s:?}"))
            })?,
            Some(other) => {
                return Err(DocumentError::MalformedMetadata(format!(
                    "`date` is not a calendar date: {other}"
                )));
            }
        };
        self.insert("date", MetaValue::Date(date));

        for key in ["images", "tags"] {
            if let Some(MetaValue::Str(s)) = self.get(key) {
                let single = vec![s.clone()];
                self.insert(key, MetaValue::List(single));
            }
        }

        Ok(self)
    }
}
