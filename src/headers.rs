/// An ordered, case-insensitive multi-map of HTTP header fields.
///
/// Grounded on `server/buffered.rs`'s `Request::headers: Vec<(String,
/// Vec<u8>)>` in the teacher crate: headers are stored in arrival order
/// (never sorted or hashed away), duplicates are preserved as distinct
/// entries, and lookups compare names ASCII case-insensitively. Spec §3
/// requires exactly this shape for both the request and response header
/// maps.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> HeaderMap {
        HeaderMap { entries: Vec::new() }
    }

    /// Appends a header, preserving the name's original case and any
    /// existing entries with the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the value of the first header matching `name`
    /// (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value for headers matching `name` (case-insensitive),
    /// in arrival order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry but retains the backing `Vec`'s capacity, so a
    /// `reset()`-ed `Exchange` on a keep-alive connection does not pay for a
    /// fresh allocation on the very next request. This is the idiomatic Rust
    /// analogue of the `clearRetainingCapacity` the spec's open questions
    /// discuss (SPEC_FULL.md §9) — see DESIGN.md for the full resolution.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
