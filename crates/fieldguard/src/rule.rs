//! Authorization rules.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;
use crate::whitelist::WhitelistSpec;

/// Name of a logical operation (a query or mutation field).
///
/// Distinct schema locations may share a name and thereby share rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationName(String);

impl OperationName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for OperationName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for OperationName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A declared rule: who may call an operation and what they get to see.
///
/// An empty whitelist means the resolver's result is returned unfiltered.
#[derive(Debug, Clone)]
pub struct Rule {
    operation: OperationName,
    pattern: Pattern,
    whitelist: WhitelistSpec,
    /// Position in declaration order, assigned by the registry.
    index: usize,
}

impl Rule {
    /// Creates a rule with an empty (pass-through) whitelist.
    pub fn new(operation: impl Into<OperationName>, pattern: Pattern) -> Self {
        Self {
            operation: operation.into(),
            pattern,
            whitelist: WhitelistSpec::new(),
            index: 0,
        }
    }

    /// Sets the whitelist (builder pattern).
    pub fn with_whitelist(mut self, whitelist: WhitelistSpec) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn operation(&self) -> &OperationName {
        &self.operation
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn whitelist(&self) -> &WhitelistSpec {
        &self.whitelist
    }

    /// Declaration index of this rule across the whole registry.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns `true` if results are returned without filtering.
    pub fn is_pass_through(&self) -> bool {
        self.whitelist.is_empty()
    }
}
