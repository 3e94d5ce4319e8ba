use sqlx::FromRow;
use sqlx::postgres::PgRow;
use tracing::trace;

use super::ShardRows;
use crate::context::ShardContext;
use crate::core::value::{bind_params, bind_params_as};
use crate::core::{Result, SqlParam};

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardExecution {
    pub rows_affected: u64,
    pub shard: String,
}

impl ShardContext {
    /// Run `sql` on the shard that owns `id`.
    ///
    /// Uses one pooled connection and no implicit transaction. Database errors
    /// are returned as-is (classified) and never retried.
    pub async fn run_on_owner<T>(
        &self,
        id: &str,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<ShardRows<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let (shard, pool) = self.owner(id)?;
        trace!(shard = %shard, id, "run_on_owner");

        let rows = bind_params_as(sqlx::query_as::<_, T>(sql), params)
            .fetch_all(pool)
            .await?;

        Ok(ShardRows { rows, shard })
    }

    /// Like [`run_on_owner`](Self::run_on_owner) for statements without a
    /// result set, reporting how many rows were touched.
    pub async fn execute_on_owner(
        &self,
        id: &str,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<ShardExecution> {
        let (shard, pool) = self.owner(id)?;
        trace!(shard = %shard, id, "execute_on_owner");

        let result = bind_params(sqlx::query(sql), params).execute(pool).await?;

        Ok(ShardExecution {
            rows_affected: result.rows_affected(),
            shard,
        })
    }
}
