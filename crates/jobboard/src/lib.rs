//! # jobboard
//!
//! Postgres data access for job listings and the companies that post them.
//!
//! ## Features
//!
//! - **Filtered search**: sparse [`JobFilter`] criteria compile to a parameterized `WHERE` clause
//! - **Partial updates**: sparse [`JobUpdate`] payloads compile to a parameterized `SET` list
//! - **Injected storage**: every operation takes `&impl GenericClient`, so a connection, a pooled
//!   connection, a transaction or a test double all work
//! - **SQL logging**: wrap any client in [`TracingClient`] to log statements via `tracing`
//!
//! ## Example
//!
//! ```ignore
//! use jobboard::{DbConfig, Job, JobFilter, JobUpdate, TracingClient, create_pool};
//!
//! let config = DbConfig::from_env()?;
//! let pool = create_pool(&config)?;
//! let conn = TracingClient::from_config(pool.get().await?, &config);
//!
//! let jobs = Job::find_all(&conn, &JobFilter::new().min_salary(100_000).has_equity(true)).await?;
//! let job = Job::update(&conn, jobs[0].id, &JobUpdate::new().title("Staff Engineer")).await?;
//! Job::remove(&conn, job.id).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod ident;
pub mod models;
pub mod monitor;
pub mod param;
pub mod row;
pub mod sql;

pub use client::GenericClient;
pub use config::DbConfig;
pub use error::{DbError, DbResult};
pub use ident::Ident;
pub use models::{Company, Job, JobDetail, JobFilter, JobListing, JobUpdate, NewJob};
pub use monitor::TracingClient;
pub use param::{Param, ParamList};
pub use row::{FromRow, RowExt};
pub use sql::{ColumnMap, SetClause, UpdateMap, WhereClause, sql_for_partial_update};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_tls};
