//! Connection pool utilities

use crate::config::DbConfig;
use crate::error::{DbError, DbResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::Socket;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};

/// Create a connection pool from a [`DbConfig`], without TLS.
///
/// # Example
///
/// ```ignore
/// let pool = jobboard::create_pool(&DbConfig::from_env()?)?;
/// let client = pool.get().await?;
/// let jobs = Job::find_all(&client, &JobFilter::default()).await?;
/// ```
pub fn create_pool(config: &DbConfig) -> DbResult<Pool> {
    create_pool_with_tls(config, NoTls)
}

/// Create a connection pool using a custom TLS connector.
pub fn create_pool_with_tls<T>(config: &DbConfig, tls: T) -> DbResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let max_size = config.max_pool_size;
    create_pool_with_manager_config(&config.url, tls, default_manager_config(), |builder| {
        builder.max_size(max_size)
    })
}

/// Create a connection pool with injected `deadpool_postgres::ManagerConfig` and `PoolBuilder`.
pub fn create_pool_with_manager_config<T>(
    database_url: &str,
    tls: T,
    manager_config: ManagerConfig,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> DbResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| DbError::Connection(e.to_string()))?;

    let mgr = Manager::from_config(pg_config, tls, manager_config);
    configure_pool(Pool::builder(mgr))
        .build()
        .map_err(|e| DbError::Pool(e.to_string()))
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_url() {
        let err = create_pool(&DbConfig::new("not a url at all ://")).unwrap_err();
        assert!(matches!(err, DbError::Connection(_)));
    }

    #[tokio::test]
    async fn builds_pool_without_connecting() {
        let pool = create_pool(&DbConfig::new("postgres://u:p@localhost/jobly").max_pool_size(3))
            .unwrap();
        assert_eq!(pool.status().max_size, 3);
    }
}
