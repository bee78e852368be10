use std::collections::HashSet;

/// Event names to leave out of the exported plan.
///
/// Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    names: HashSet<String>,
}

impl Exclusions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the free-text form: entries separated by `;`, with the first
    /// newline removed. Entries are kept verbatim, surrounding spaces
    /// included.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.replacen('\n', "", 1);
        raw.split(';').map(str::to_string).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Exclusions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Exclusions {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
