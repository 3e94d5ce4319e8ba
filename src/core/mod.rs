pub mod error;
pub mod value;

pub use error::{Entity, Result, ShardError};
pub use value::SqlParam;
