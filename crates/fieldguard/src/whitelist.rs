//! Field whitelists.
//!
//! A whitelist lists the fields of a resolver result that a caller may see.
//! Bare names keep a value as is; nested entries keep the value but filter
//! it again through their own whitelist.
//!
//! Whitelists serialize as arrays mixing names and single-key objects, which
//! is also the shape used in rule files:
//!
//! ```
//! use fieldguard::WhitelistSpec;
//! use serde_json::json;
//!
//! let whitelist: WhitelistSpec = serde_json::from_value(json!([
//!     "name",
//!     { "posts": ["title", "body", { "comments": ["body"] }] }
//! ]))
//! .unwrap();
//!
//! assert!(whitelist.has_field("name"));
//! let posts = whitelist.sub_whitelist("posts").unwrap();
//! assert!(posts.sub_whitelist("comments").is_some());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single whitelist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhitelistEntry {
    /// Keep the field's value unchanged.
    Field(String),
    /// Keep the field but filter its value through a sub-whitelist.
    Nested(String, WhitelistSpec),
}

/// Ordered list of whitelist entries.
///
/// Names are expected to be unique. When they are not, a bare field entry
/// takes precedence over nested entries and the first nested entry wins.
/// An empty object (`{}`) declares nothing and is rejected when parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RawEntry>", into = "Vec<RawEntry>")]
pub struct WhitelistSpec {
    entries: Vec<WhitelistEntry>,
}

impl WhitelistSpec {
    /// Creates an empty whitelist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a whitelist of bare field names.
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(|n| WhitelistEntry::Field(n.into()))
            .collect()
    }

    /// Adds a bare field (builder pattern).
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.entries.push(WhitelistEntry::Field(name.into()));
        self
    }

    /// Adds a nested field with its own whitelist (builder pattern).
    pub fn nested(mut self, name: impl Into<String>, spec: WhitelistSpec) -> Self {
        self.entries.push(WhitelistEntry::Nested(name.into(), spec));
        self
    }

    /// Returns `true` if the whitelist has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if `name` is listed as a bare field.
    pub fn has_field(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, WhitelistEntry::Field(n) if n == name))
    }

    /// Returns the sub-whitelist declared for `name`, if any.
    pub fn sub_whitelist(&self, name: &str) -> Option<&WhitelistSpec> {
        self.entries.iter().find_map(|e| match e {
            WhitelistEntry::Nested(n, spec) if n == name => Some(spec),
            _ => None,
        })
    }
}

impl FromIterator<WhitelistEntry> for WhitelistSpec {
    fn from_iter<T: IntoIterator<Item = WhitelistEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Wire form of an entry: `"name"` or `{ "name": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Field(String),
    Nested(BTreeMap<String, WhitelistSpec>),
}

impl TryFrom<Vec<RawEntry>> for WhitelistSpec {
    type Error = String;

    fn try_from(raw: Vec<RawEntry>) -> Result<Self, Self::Error> {
        let mut entries = Vec::with_capacity(raw.len());
        for (position, entry) in raw.into_iter().enumerate() {
            match entry {
                RawEntry::Field(name) => entries.push(WhitelistEntry::Field(name)),
                RawEntry::Nested(map) if map.is_empty() => {
                    return Err(format!("whitelist entry {position} is an empty object"));
                }
                RawEntry::Nested(map) => {
                    for (name, spec) in map {
                        entries.push(WhitelistEntry::Nested(name, spec));
                    }
                }
            }
        }
        Ok(Self { entries })
    }
}

impl From<WhitelistSpec> for Vec<RawEntry> {
    fn from(spec: WhitelistSpec) -> Self {
        spec.entries
            .into_iter()
            .map(|entry| match entry {
                WhitelistEntry::Field(name) => RawEntry::Field(name),
                WhitelistEntry::Nested(name, spec) => {
                    RawEntry::Nested(BTreeMap::from([(name, spec)]))
                }
            })
            .collect()
    }
}
