use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Session credentials: every cookie needed to authenticate API calls
///
/// The map is replaced or overwritten key-by-key whenever the platform rotates
/// cookies. Keys are kept sorted so the persisted record and the `Cookie`
/// header are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overwrites matching keys with the values in `rotated`, keeping the rest
    ///
    /// Returns true if anything changed.
    pub fn absorb(&mut self, rotated: &Credentials) -> bool {
        let mut changed = false;
        for (name, value) in rotated.iter() {
            if self.get(name) != Some(value) {
                self.insert(name, value);
                changed = true;
            }
        }
        changed
    }

    /// Names from `required` that are not present
    pub fn missing<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|name| !self.contains(name))
            .map(String::as_str)
            .collect()
    }

    /// Renders the map as a `Cookie` request header value
    pub fn cookie_header(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl FromIterator<(String, String)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}
