//! Front matter extraction.
//!
//! A document may open with a metadata block fenced by `---` (YAML) or
//! `+++` (TOML). The fence must be the very first line; the closing fence
//! is the next line consisting of the same marker.
//!
//! ```text
//! ---
//! title: Hello
//! date: 2024-01-05
//! ---
//! Body starts here.
//! ```

use super::metadata::{MetaValue, Metadata};
use crate::error::DocumentError;

/// Front matter syntax, identified by its fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
}

impl Format {
    const fn fence(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// Raw split of a source file.
#[derive(Debug, PartialEq, Eq)]
pub struct Split<'a> {
    pub front: Option<(Format, &'a str)>,
    pub body: &'a str,
}

/// Split `source` into its front matter block and body.
///
/// Fails when an opening fence is never closed.
pub fn split(source: &str) -> Result<Split<'_>, DocumentError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let (first, rest) = split_line(source);
    let format = match first.trim_end() {
        "---" => Format::Yaml,
        "+++" => Format::Toml,
        _ => {
            return Ok(Split {
                front: None,
                body: source,
            });
        }
    };

    let mut offset = 0;
    let mut remaining = rest;
    while !remaining.is_empty() {
        let (line, next) = split_line(remaining);
        if line.trim_end() == format.fence() {
            return Ok(Split {
                front: Some((format, &rest[..offset])),
                body: next,
            });
        }
        offset += remaining.len() - next.len();
        remaining = next;
    }

    Err(DocumentError::MalformedMetadata(format!(
        "front matter opened with `{}` is never closed",
        format.fence()
    )))
}

/// Split off the first line (without its terminator) from the rest.
fn split_line(text: &str) -> (&str, &str) {
    match text.find('\n') {
        Some(idx) => (text[..idx].trim_end_matches('\r'), &text[idx + 1..]),
        None => (text, ""),
    }
}

/// Parse a front matter block into ordered metadata.
pub fn parse(format: Format, block: &str) -> Result<Metadata, DocumentError> {
    match format {
        Format::Yaml => parse_yaml(block),
        Format::Toml => parse_toml(block),
    }
}

fn malformed(err: impl std::fmt::Display) -> DocumentError {
    DocumentError::MalformedMetadata(err.to_string())
}

// ============================================================================
// YAML
// ============================================================================

fn parse_yaml(block: &str) -> Result<Metadata, DocumentError> {
    use serde_yaml_ng::Value;

    let value: Value = serde_yaml_ng::from_str(block).map_err(malformed)?;
    let mapping = match value {
        Value::Null => return Ok(Metadata::default()),
        Value::Mapping(mapping) => mapping,
        _ => return Err(malformed("front matter is not a key-value mapping")),
    };

    let mut metadata = Metadata::default();
    for (key, value) in mapping {
        let Value::String(key) = key else {
            return Err(malformed("front matter keys must be strings"));
        };
        if let Some(value) = yaml_value(&key, value)? {
            metadata.insert(key, value);
        }
    }
    Ok(metadata)
}

fn yaml_value(key: &str, value: serde_yaml_ng::Value) -> Result<Option<MetaValue>, DocumentError> {
    use serde_yaml_ng::Value;

    Ok(Some(match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => MetaValue::Bool(b),
        Value::Number(n) => MetaValue::Number(n.as_f64().unwrap_or_default()),
        Value::String(s) => MetaValue::Str(s),
        Value::Sequence(items) => MetaValue::List(
            items
                .into_iter()
                .map(|item| yaml_scalar(key, item))
                .collect::<Result<_, _>>()?,
        ),
        Value::Tagged(tagged) => return yaml_value(key, tagged.value),
        Value::Mapping(_) => {
            return Err(malformed(format!("`{key}` must be a scalar or a list, not a mapping")));
        }
    }))
}

fn yaml_scalar(key: &str, value: serde_yaml_ng::Value) -> Result<String, DocumentError> {
    use serde_yaml_ng::Value;

    match value {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(malformed(format!("`{key}` list items must be scalars"))),
    }
}

// ============================================================================
// TOML
// ============================================================================

fn parse_toml(block: &str) -> Result<Metadata, DocumentError> {
    let table: toml::Table = toml::from_str(block).map_err(malformed)?;

    // `toml::Table` is sorted by key; recover document order from the block.
    let mut entries: Vec<_> = table.into_iter().collect();
    entries.sort_by_key(|(key, _)| key_position(block, key));

    let mut metadata = Metadata::default();
    for (key, value) in entries {
        let value = toml_value(&key, value)?;
        metadata.insert(key, value);
    }
    Ok(metadata)
}

/// Byte offset of the line defining `key`, for ordering.
fn key_position(block: &str, key: &str) -> usize {
    block
        .lines()
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len() + 1;
            Some((start, line))
        })
        .find(|(_, line)| {
            let trimmed = line.trim_start().trim_start_matches(['"', '\'']);
            trimmed
                .strip_prefix(key)
                .is_some_and(|after| after.trim_start_matches(['"', '\'']).trim_start().starts_with('='))
        })
        .map_or(usize::MAX, |(start, _)| start)
}

fn toml_value(key: &str, value: toml::Value) -> Result<MetaValue, DocumentError> {
    use toml::Value;

    Ok(match value {
        Value::String(s) => MetaValue::Str(s),
        Value::Boolean(b) => MetaValue::Bool(b),
        Value::Integer(i) => MetaValue::Number(i as f64),
        Value::Float(f) => MetaValue::Number(f),
        Value::Datetime(dt) => MetaValue::Str(dt.to_string()),
        Value::Array(items) => MetaValue::List(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    Value::Boolean(b) => Ok(b.to_string()),
                    Value::Integer(i) => Ok(i.to_string()),
                    Value::Float(f) => Ok(f.to_string()),
                    Value::Datetime(dt) => Ok(dt.to_string()),
                    _ => Err(malformed(format!("`{key}` list items must be scalars"))),
                })
                .collect::<Result<_, _>>()?,
        ),
        Value::Table(_) => {
            return Err(malformed(format!("`{key}` must be a scalar or a list, not a table")));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_yaml() {
        let src = "---\ntitle: Hi\n---\nBody\n";
        let split = split(src).unwrap();
        assert_eq!(split.front, Some((Format::Yaml, "title: Hi\n")));
        assert_eq!(split.body, "Body\n");
    }

    #[test]
    fn test_split_toml_crlf() {
        let src = "+++\r\ntitle = \"Hi\"\r\n+++\r\nBody";
        let split = split(src).unwrap();
        assert_eq!(split.front, Some((Format::Toml, "title = \"Hi\"\r\n")));
        assert_eq!(split.body, "Body");
    }

    #[test]
    fn test_split_without_front_matter() {
        let split = split("# Just a heading\n").unwrap();
        assert_eq!(split.front, None);
        assert_eq!(split.body, "# Just a heading\n");
    }

    #[test]
    fn test_split_empty_block() {
        let split = split("---\n---\nBody").unwrap();
        assert_eq!(split.front, Some((Format::Yaml, "")));
        assert_eq!(split.body, "Body");
    }

    #[test]
    fn test_split_unterminated() {
        let err = split("---\ntitle: Hi\nBody\n").unwrap_err();
        assert_eq!(err.kind(), "MalformedMetadata");
    }

    #[test]
    fn test_split_strips_bom() {
        let split = split("\u{feff}---\ntitle: Hi\n---\n").unwrap();
        assert!(split.front.is_some());
    }

    #[test]
    fn test_horizontal_rule_in_body_is_not_a_fence() {
        let split = split("Intro\n---\nMore").unwrap();
        assert_eq!(split.front, None);
    }

    #[test]
    fn test_parse_yaml_values() {
        let meta = parse(
            Format::Yaml,
            "title: Hello\ndate: 2024-01-05\nimages:\n  - a.png\n  - b.png\ndraft: false\nweight: 3\n",
        )
        .unwrap();

        let keys: Vec<_> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["title", "date", "images", "draft", "weight"]);
        assert_eq!(meta.title(), "Hello");
        assert_eq!(meta.get_str("date"), Some("2024-01-05"));
        assert_eq!(meta.images(), ["a.png", "b.png"]);
        assert_eq!(meta.get("draft"), Some(&MetaValue::Bool(false)));
        assert_eq!(meta.get("weight"), Some(&MetaValue::Number(3.0)));
    }

    #[test]
    fn test_parse_yaml_not_a_mapping() {
        let err = parse(Format::Yaml, "- just\n- a list\n").unwrap_err();
        assert_eq!(err.kind(), "MalformedMetadata");
    }

    #[test]
    fn test_parse_yaml_syntax_error() {
        let err = parse(Format::Yaml, "title: [unclosed\n").unwrap_err();
        assert_eq!(err.kind(), "MalformedMetadata");
    }

    #[test]
    fn test_parse_yaml_nested_mapping_rejected() {
        let err = parse(Format::Yaml, "title: Hi\nseo:\n  keywords: x\n").unwrap_err();
        assert!(err.to_string().contains("seo"));
    }

    #[test]
    fn test_parse_yaml_empty_block() {
        assert!(parse(Format::Yaml, "").unwrap().is_empty());
    }

    #[test]
    fn test_parse_toml_keeps_document_order() {
        let meta = parse(
            Format::Toml,
            "title = \"Hello\"\ndate = 2024-01-05\ntags = [\"rust\", \"ssg\"]\nauthor = \"Ann\"\n",
        )
        .unwrap();

        let keys: Vec<_> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["title", "date", "tags", "author"]);
        assert_eq!(meta.get_str("date"), Some("2024-01-05"));
        assert_eq!(meta.tags(), ["rust", "ssg"]);
    }

    #[test]
    fn test_parse_toml_table_rejected() {
        let err = parse(Format::Toml, "title = \"Hi\"\n[extra]\nx = 1\n").unwrap_err();
        assert_eq!(err.kind(), "MalformedMetadata");
    }
}
