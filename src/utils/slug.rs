//! Heading anchor slugs.
//!
//! Converts heading text to URL-fragment-safe ids, transliterating
//! non-ASCII text with `deunicode` ("Über uns" → "uber-uns").

use rustc_hash::FxHashMap;

/// Convert text to a lowercase, hyphen-separated ASCII slug.
///
/// Returns `"section"` when nothing usable is left.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "section".to_owned()
    } else {
        slug
    }
}

/// Hands out unique slugs within one document: repeats get `-1`, `-2`, ...
#[derive(Default)]
pub struct SlugSet {
    seen: FxHashMap<String, usize>,
}

impl SlugSet {
    /// Mark an id as taken without generating one, e.g. an explicit
    /// `{#id}` heading attribute.
    pub fn reserve(&mut self, id: &str) {
        self.seen.entry(id.to_owned()).or_insert(0);
    }

    pub fn unique(&mut self, text: &str) -> String {
        let base = slugify(text);
        let Some(&last) = self.seen.get(&base) else {
            self.seen.insert(base.clone(), 0);
            return base;
        };

        let mut count = last;
        let candidate = loop {
            count += 1;
            let candidate = format!("{base}-{count}");
            if !self.seen.contains_key(&candidate) {
                break candidate;
            }
        };
        self.seen.insert(base, count);
        self.seen.insert(candidate.clone(), 0);
        candidate
    }
}
