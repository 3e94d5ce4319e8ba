//! Statement execution against one shard, every shard, or whichever shard
//! holds a row.

pub mod fanout;
pub mod scatter;
pub mod single;

use serde::Serialize;

pub use fanout::{FanOut, ShardOutcome, ShardReport};
pub use scatter::{
    LinearScanLocator, Located, ProbeOutcome, ScatterHit, ScatterTable, ShardLocator, ShardProbe,
};
pub use single::ShardExecution;

/// Rows returned by a single shard, tagged with that shard's name.
#[derive(Debug, Clone)]
pub struct ShardRows<T> {
    pub rows: Vec<T>,
    pub shard: String,
}

impl<T> ShardRows<T> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// First row, keeping the shard tag.
    pub fn into_first(self) -> Option<Sharded<T>> {
        let shard = self.shard;
        self.rows
            .into_iter()
            .next()
            .map(|value| Sharded { value, shard })
    }
}

/// A single value together with the shard it was read from.
#[derive(Debug, Clone, Serialize)]
pub struct Sharded<T> {
    #[serde(flatten)]
    pub value: T,
    pub shard: String,
}

impl<T> Sharded<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sharded<U> {
        Sharded {
            value: f(self.value),
            shard: self.shard,
        }
    }
}
