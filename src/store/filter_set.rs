use serde::{Deserialize, Serialize};

/// Insertion-ordered set of filter logins.
///
/// Values are compared case-sensitively and stored verbatim, so a login may
/// contain commas or be the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FilterSet(Vec<String>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` unless it is already present. Returns `false` for a duplicate.
    pub fn insert(&mut self, value: &str) -> bool {
        if self.contains(value) {
            return false;
        }
        self.0.push(value.to_string());
        true
    }

    /// Drop every entry equal to `value`. Returns whether anything was removed.
    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|v| v != value);
        self.0.len() != before
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Human-readable listing, e.g. `alice, bob`.
    pub fn display_list(&self) -> String {
        self.0.join(", ")
    }
}

impl From<Vec<String>> for FilterSet {
    fn from(values: Vec<String>) -> Self {
        values.into_iter().collect()
    }
}

impl From<FilterSet> for Vec<String> {
    fn from(set: FilterSet) -> Self {
        set.0
    }
}

impl FromIterator<String> for FilterSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = FilterSet::new();
        for value in iter {
            set.insert(&value);
        }
        set
    }
}

impl<'a> FromIterator<&'a str> for FilterSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = FilterSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}
