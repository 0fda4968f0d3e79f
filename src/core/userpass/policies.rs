// src/core/userpass/policies.rs

//! Normalization of policy lists supplied as comma-separated strings or sequences.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The policy that grants everything. Any list naming it collapses to just this entry.
pub const ROOT_POLICY: &str = "root";

/// A normalized, deduplicated, insertion-ordered set of policy names.
///
/// Every constructor normalizes: names are trimmed and lowercased, empty names are
/// dropped, and duplicates keep their first position. The canonical string form is
/// the names joined by `,`, and parsing that form yields the same list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PolicyList(IndexSet<String>);

impl PolicyList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw comma-separated string. The empty string means "no policies".
    pub fn parse(raw: &str) -> Self {
        Self::from_names(raw.split(','))
    }

    /// Normalizes a sequence of names. An element holding commas is split like a raw
    /// string, so no stored name ever contains `,`.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = IndexSet::new();
        for element in names {
            for name in element.as_ref().split(',') {
                let name = name.trim().to_lowercase();
                if name.is_empty() {
                    continue;
                }
                if name == ROOT_POLICY {
                    set.clear();
                    set.insert(name);
                    return PolicyList(set);
                }
                set.insert(name);
            }
        }
        PolicyList(set)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The names in order, borrowed. Handy for comparisons.
    pub fn names(&self) -> Vec<&str> {
        self.iter().collect()
    }

    /// The stable `a,b,c` form of the list.
    pub fn to_canonical_string(&self) -> String {
        self.names().join(",")
    }
}

// `IndexSet` equality ignores order; two policy lists are only equal in the same order.
impl PartialEq for PolicyList {
    fn eq(&self, other: &Self) -> bool {
        self.0.iter().eq(other.0.iter())
    }
}

impl Eq for PolicyList {}

impl fmt::Display for PolicyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl FromStr for PolicyList {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PolicyList::parse(s))
    }
}

impl<S: AsRef<str>> FromIterator<S> for PolicyList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        PolicyList::from_names(iter)
    }
}

impl From<Vec<String>> for PolicyList {
    fn from(names: Vec<String>) -> Self {
        PolicyList::from_names(names)
    }
}

impl From<PolicyList> for Vec<String> {
    fn from(list: PolicyList) -> Self {
        list.0.into_iter().collect()
    }
}

/// A policy list exactly as the caller supplied it, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyInput {
    /// A single comma-separated string, e.g. `"admin, ops"`.
    Raw(String),
    /// A list of names, e.g. a JSON array.
    List(Vec<String>),
}

impl PolicyInput {
    pub fn normalize(&self) -> PolicyList {
        match self {
            PolicyInput::Raw(raw) => PolicyList::parse(raw),
            PolicyInput::List(names) => PolicyList::from_names(names),
        }
    }
}

impl From<&str> for PolicyInput {
    fn from(raw: &str) -> Self {
        PolicyInput::Raw(raw.to_string())
    }
}

impl From<String> for PolicyInput {
    fn from(raw: String) -> Self {
        PolicyInput::Raw(raw)
    }
}

impl From<Vec<String>> for PolicyInput {
    fn from(names: Vec<String>) -> Self {
        PolicyInput::List(names)
    }
}
