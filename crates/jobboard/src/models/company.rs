use crate::client::GenericClient;
use crate::error::{DbError, DbResult};
use crate::row::{FromRow, RowExt};
use serde::Serialize;
use tokio_postgres::Row;

/// A company that owns job listings. Read-only from this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            description: row.try_get_column("description")?,
            num_employees: row.try_get_column("num_employees")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

impl Company {
    /// Fetch a company by handle.
    ///
    /// Fails with [`DbError::NotFound`] if no company has that handle.
    pub async fn get(conn: &impl GenericClient, handle: &str) -> DbResult<Company> {
        let row = conn
            .query_opt_tagged(
                "companies.get",
                "SELECT handle, name, description, num_employees, logo_url \
                 FROM companies \
                 WHERE handle = $1",
                &[&handle],
            )
            .await?
            .ok_or_else(|| DbError::not_found(format!("No company: {handle}")))?;
        Company::from_row(&row)
    }
}
