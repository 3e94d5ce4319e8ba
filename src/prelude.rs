//! Imports for code that talks to the shards directly.
//!
//! `use travel_shards::prelude::*;` brings in the context, the domain store and
//! the result types every operation returns.

pub use crate::connection::{PoolSettings, ShardMap};
pub use crate::context::ShardContext;
pub use crate::core::{Entity, Result, ShardError, SqlParam};
pub use crate::domain::{
    Location, LocationPatch, NewLocation, NewTravelPlan, TravelPlan, TravelPlanPatch,
    TravelStore,
};
pub use crate::executor::{FanOut, Located, ScatterTable, ShardRows, Sharded};
