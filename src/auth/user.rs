//! The identity that owns income and expense records.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A newtype wrapper for integer user IDs.
///
/// Reports and summaries are always scoped to a single user ID, which the
/// auth guard extracts from the request before any handler runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
