//! Caller attributes.
//!
//! Attributes are supplied fresh on every call: a mapping from group name
//! (`groups`, `permissions`, ...) to the caller's values for that group.
//! A scalar value is a one-element list. A group supplied with an empty list
//! is still *present*; that matters for `and` mode and for bans.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

/// A single attribute value as it appears in serialized input.
///
/// Accepts either `"admin"` or `["admin", "reg-user"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    One(String),
    Many(Vec<String>),
}

impl AttributeValue {
    fn into_values(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// The caller's attribute set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, AttributeValue>")]
pub struct Attributes {
    groups: BTreeMap<String, Vec<String>>,
}

impl From<BTreeMap<String, AttributeValue>> for Attributes {
    fn from(map: BTreeMap<String, AttributeValue>) -> Self {
        Self {
            groups: map
                .into_iter()
                .map(|(group, value)| (group, value.into_values()))
                .collect(),
        }
    }
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a group to a list of values (builder pattern).
    pub fn with_values<G, I, V>(mut self, group: G, values: I) -> Self
    where
        G: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.insert(group, values);
        self
    }

    /// Sets a group to a single scalar value (builder pattern).
    pub fn with_value(mut self, group: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(group, [value.into()]);
        self
    }

    /// Sets a group, replacing any earlier values.
    pub fn insert<G, I, V>(&mut self, group: G, values: I)
    where
        G: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.groups
            .insert(group.into(), values.into_iter().map(Into::into).collect());
    }

    /// The caller's values for `group`, or `None` when the group is absent.
    pub fn get(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(group, values)| (group.as_str(), values.as_slice()))
    }
}

impl Serialize for Attributes {
    /// Serializes as a plain `group -> [values]` map.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(&self.groups)
    }
}
