//! SQL logging via `tracing`.
//!
//! [`TracingClient`] wraps any [`GenericClient`] and emits events on the
//! `jobboard.sql` target:
//! - `debug` before a statement runs (SQL text, tag, parameter count),
//! - `debug` after it completes (elapsed time, row count),
//! - `warn` when it exceeds the slow-query threshold,
//! - `error` when it fails.
//!
//! ```ignore
//! let client = TracingClient::new(pool.get().await?)
//!     .with_slow_query_threshold(Duration::from_millis(250));
//! let job = Job::get(&client, 42).await?;
//! ```

use crate::client::GenericClient;
use crate::config::DbConfig;
use crate::error::DbResult;
use std::time::{Duration, Instant};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// A `GenericClient` wrapper that logs every statement through `tracing`.
pub struct TracingClient<C> {
    client: C,
    max_sql_length: Option<usize>,
    slow_query_threshold: Option<Duration>,
}

impl<C: GenericClient> TracingClient<C> {
    /// Wrap `client` with defaults (SQL truncated to 200 bytes, no slow-query warning).
    pub fn new(client: C) -> Self {
        Self {
            client,
            max_sql_length: Some(200),
            slow_query_threshold: None,
        }
    }

    /// Wrap `client` using the logging settings of a [`DbConfig`].
    pub fn from_config(client: C, config: &DbConfig) -> Self {
        Self {
            client,
            max_sql_length: config.log_sql_max_length,
            slow_query_threshold: config.slow_query_threshold,
        }
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Warn about statements slower than `threshold`.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Get a reference to the inner client.
    pub fn inner(&self) -> &C {
        &self.client
    }

    /// Get the inner client, consuming this wrapper.
    pub fn into_inner(self) -> C {
        self.client
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }

    async fn run(
        &self,
        tag: Option<&str>,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> DbResult<Vec<Row>> {
        let label = tag.unwrap_or("-");
        tracing::debug!(
            target: "jobboard.sql",
            tag = label,
            param_count = params.len(),
            sql = %self.truncate_sql(sql),
        );

        let start = Instant::now();
        let result = match tag {
            Some(t) => self.client.query_tagged(t, sql, params).await,
            None => self.client.query(sql, params).await,
        };
        let elapsed = start.elapsed();

        match &result {
            Ok(rows) => {
                tracing::debug!(
                    target: "jobboard.sql",
                    tag = label,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    rows = rows.len(),
                    "query complete",
                );
                if let Some(threshold) = self.slow_query_threshold {
                    if elapsed > threshold {
                        tracing::warn!(
                            target: "jobboard.sql",
                            tag = label,
                            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                            threshold_ms = threshold.as_secs_f64() * 1000.0,
                            sql = %self.truncate_sql(sql),
                            "slow query",
                        );
                    }
                }
            }
            Err(e) => {
                tracing::error!(
                    target: "jobboard.sql",
                    tag = label,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    error = %e,
                    sql = %self.truncate_sql(sql),
                    "query failed",
                );
            }
        }
        result
    }
}

impl<C: GenericClient> GenericClient for TracingClient<C> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
        self.run(None, sql, params).await
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> DbResult<Vec<Row>> {
        self.run(Some(tag), sql, params).await
    }
}
