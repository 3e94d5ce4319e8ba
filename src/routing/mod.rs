use std::collections::HashSet;

use crate::core::{Result, ShardError};

/// Prefix prepended to the routing character to form a shard name.
pub const DEFAULT_SHARD_PREFIX: &str = "db_";

/// Computes the shard label for an identifier.
///
/// Only the final character of `id` is used, lowercased, so `"...A"` and
/// `"...a"` land on the same shard. Returns `None` for an empty id.
pub fn shard_label(id: &str, prefix: &str) -> Option<String> {
    let last = id.chars().next_back()?;
    let mut label = String::with_capacity(prefix.len() + 4);
    label.push_str(prefix);
    label.extend(last.to_lowercase());
    Some(label)
}

/// Maps entity identifiers onto configured shard names.
///
/// Stateless apart from the immutable set of known shards; many ids share a
/// shard by construction.
#[derive(Debug, Clone)]
pub struct ShardRouter {
    prefix: String,
    shards: HashSet<String>,
}

impl ShardRouter {
    pub fn new<I, S>(prefix: impl Into<String>, shards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefix: prefix.into(),
            shards: shards.into_iter().map(Into::into).collect(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the shard owning `id`.
    ///
    /// A derived label with no configured shard is a configuration mismatch
    /// and is reported as `ShardNotFound`.
    pub fn shard_for(&self, id: &str) -> Result<String> {
        let Some(label) = shard_label(id, &self.prefix) else {
            return Err(ShardError::ShardNotFound {
                id: id.to_string(),
                shard: self.prefix.clone(),
            });
        };

        if !self.shards.contains(&label) {
            return Err(ShardError::ShardNotFound {
                id: id.to_string(),
                shard: label,
            });
        }

        Ok(label)
    }

    /// The suffix an id must end with to land on `shard`, if the shard is
    /// addressable by a single routing character.
    pub fn routing_char(&self, shard: &str) -> Option<char> {
        let suffix = shard.strip_prefix(self.prefix.as_str())?;
        let mut chars = suffix.chars();
        let first = chars.next()?;
        chars.next().is_none().then_some(first)
    }
}
