//! Job listings: CRUD plus filtered search.

use super::company::Company;
use crate::client::GenericClient;
use crate::error::{DbError, DbResult};
use crate::row::{FromRow, RowExt};
use crate::sql::{ColumnMap, UpdateMap, WhereClause, sql_for_partial_update};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

const JOB_COLUMNS: &str = "id, title, salary, equity, company_handle";

const FIND_ALL_SQL: &str = "SELECT j.id, \
                                   j.title, \
                                   j.salary, \
                                   j.equity, \
                                   j.company_handle, \
                                   c.name AS company_name \
                            FROM jobs j \
                              LEFT JOIN companies AS c ON c.handle = j.company_handle";

/// A job listing row, as returned by create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

/// A search result: the listing plus its company's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
    pub company_name: Option<String>,
}

impl FromRow for JobListing {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
            company_name: row.try_get_column("company_name")?,
        })
    }
}

/// A single listing with its owning company embedded in place of the handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company: Company,
}

/// Data for a new listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl NewJob {
    /// Reject values the `jobs` table would refuse anyway.
    pub fn validate(&self) -> DbResult<()> {
        validate_title(&self.title)?;
        validate_salary(self.salary)?;
        validate_equity(self.equity)?;
        if self.company_handle.trim().is_empty() {
            return Err(DbError::invalid_input("companyHandle must not be empty"));
        }
        Ok(())
    }
}

/// Partial update of a listing.
///
/// Only `title`, `salary` and `equity` are mutable; any other key is rejected
/// when deserializing. Every field distinguishes "absent" (`None`) from an
/// explicit null (`Some(None)`). A null title fails validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    pub equity: Option<Option<Decimal>>,
}

impl JobUpdate {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Some(title.into()));
        self
    }

    /// Set the salary. `None` sets the column to NULL.
    pub fn salary(mut self, salary: Option<i32>) -> Self {
        self.salary = Some(salary);
        self
    }

    /// Set the equity. `None` sets the column to NULL.
    pub fn equity(mut self, equity: Option<Decimal>) -> Self {
        self.equity = Some(equity);
        self
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.to_update_map().is_empty()
    }

    /// Reject values the `jobs` table would refuse anyway.
    pub fn validate(&self) -> DbResult<()> {
        match &self.title {
            Some(Some(title)) => validate_title(title)?,
            Some(None) => return Err(DbError::invalid_input("title must not be null")),
            None => {}
        }
        if let Some(salary) = self.salary {
            validate_salary(salary)?;
        }
        if let Some(equity) = self.equity {
            validate_equity(equity)?;
        }
        Ok(())
    }

    /// The set fields as an ordered update map: title, salary, equity.
    pub fn to_update_map(&self) -> UpdateMap {
        UpdateMap::new()
            .set_opt("title", self.title.clone())
            .set_opt("salary", self.salary)
            .set_opt("equity", self.equity)
    }
}

/// Optional search criteria. Absent fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobFilter {
    /// Only listings with `salary >= min_salary`.
    pub min_salary: Option<i32>,
    /// Only `Some(true)` filters (to `equity > 0`). A non-boolean value in the
    /// input deserializes to `None`.
    #[serde(deserialize_with = "lenient_bool")]
    pub has_equity: Option<bool>,
    /// Case-insensitive substring match on the title.
    pub title: Option<String>,
}

impl JobFilter {
    /// Criteria that match every listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only listings paying at least `min_salary`.
    pub fn min_salary(mut self, min_salary: i32) -> Self {
        self.min_salary = Some(min_salary);
        self
    }

    /// `true` keeps only listings with nonzero equity; `false` does not filter.
    pub fn has_equity(mut self, has_equity: bool) -> Self {
        self.has_equity = Some(has_equity);
        self
    }

    /// Only listings whose title contains `title`, ignoring case.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Compile the criteria into a `WHERE` clause.
    ///
    /// Predicates are emitted in the order min salary, equity, title. Only
    /// `min_salary` and `title` bind values.
    pub fn where_clause(&self) -> WhereClause {
        let mut w = WhereClause::new();
        if let Some(min_salary) = self.min_salary {
            w.and_bind("salary >=", min_salary);
        }
        if self.has_equity == Some(true) {
            w.and("equity > 0");
        }
        if let Some(title) = &self.title {
            w.and_bind("title ILIKE", format!("%{title}%"));
        }
        w
    }
}

impl Job {
    /// Insert a listing and return it with its assigned id.
    pub async fn create(conn: &impl GenericClient, data: &NewJob) -> DbResult<Job> {
        data.validate()?;
        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {JOB_COLUMNS}"
        );
        let row = conn
            .query_one_tagged(
                "jobs.create",
                &sql,
                &[&data.title, &data.salary, &data.equity, &data.company_handle],
            )
            .await?;
        let job = Job::from_row(&row)?;
        tracing::debug!(target: "jobboard.job", id = job.id, company = %job.company_handle, "created job");
        Ok(job)
    }

    /// Find listings matching `filter`, ordered by title.
    ///
    /// Never fails on an empty result.
    pub async fn find_all(conn: &impl GenericClient, filter: &JobFilter) -> DbResult<Vec<JobListing>> {
        let where_clause = filter.where_clause();
        let mut sql = String::from(FIND_ALL_SQL);
        where_clause.append_to(&mut sql);
        sql.push_str(" ORDER BY title");

        let params = where_clause.params().as_refs();
        let rows = conn.query_tagged("jobs.find_all", &sql, &params).await?;
        rows.iter().map(JobListing::from_row).collect()
    }

    /// Fetch a listing with its company embedded.
    ///
    /// The two reads are not transactional.
    pub async fn get(conn: &impl GenericClient, id: i32) -> DbResult<JobDetail> {
        let row = conn
            .query_opt_tagged(
                "jobs.get",
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"),
                &[&id],
            )
            .await?
            .ok_or_else(|| no_job(id))?;
        let job = Job::from_row(&row)?;
        let company = Company::get(conn, &job.company_handle).await?;

        Ok(JobDetail {
            id: job.id,
            title: job.title,
            salary: job.salary,
            equity: job.equity,
            company,
        })
    }

    /// Apply a partial update and return the updated listing.
    ///
    /// Fails with [`DbError::InvalidInput`] if `data` sets nothing, before any
    /// statement is sent.
    pub async fn update(conn: &impl GenericClient, id: i32, data: &JobUpdate) -> DbResult<Job> {
        data.validate()?;
        let set = sql_for_partial_update(&data.to_update_map(), &ColumnMap::new())?;
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING {JOB_COLUMNS}",
            set.to_sql(),
            set.next_index()
        );

        let mut params: Vec<&(dyn ToSql + Sync)> = set.params().as_refs();
        params.push(&id);
        let row = conn
            .query_opt_tagged("jobs.update", &sql, &params)
            .await?
            .ok_or_else(|| no_job(id))?;
        tracing::debug!(target: "jobboard.job", id, fields = set.len(), "updated job");
        Job::from_row(&row)
    }

    /// Delete a listing.
    pub async fn remove(conn: &impl GenericClient, id: i32) -> DbResult<()> {
        conn.query_opt_tagged("jobs.remove", "DELETE FROM jobs WHERE id = $1 RETURNING id", &[&id])
            .await?
            .ok_or_else(|| no_job(id))?;
        tracing::debug!(target: "jobboard.job", id, "removed job");
        Ok(())
    }
}

fn no_job(id: i32) -> DbError {
    DbError::not_found(format!("No job: {id}"))
}

fn validate_title(title: &str) -> DbResult<()> {
    if title.trim().is_empty() {
        return Err(DbError::invalid_input("title must not be empty"));
    }
    Ok(())
}

fn validate_salary(salary: Option<i32>) -> DbResult<()> {
    match salary {
        Some(s) if s < 0 => Err(DbError::invalid_input(format!(
            "salary must be >= 0, got {s}"
        ))),
        _ => Ok(()),
    }
}

fn validate_equity(equity: Option<Decimal>) -> DbResult<()> {
    match equity {
        Some(e) if e < Decimal::ZERO || e > Decimal::ONE => Err(DbError::invalid_input(format!(
            "equity must be between 0 and 1, got {e}"
        ))),
        _ => Ok(()),
    }
}

/// A present key (even `null`) becomes `Some(..)`; an absent one stays `None` via `default`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Some(b),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Call {
        tag: String,
        sql: String,
        params: Vec<String>,
    }

    /// Records every statement and answers with no rows.
    #[derive(Default)]
    struct RecordingClient {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingClient {
        fn calls(&self) -> std::sync::MutexGuard<'_, Vec<Call>> {
            self.calls.lock().unwrap()
        }
    }

    impl GenericClient for RecordingClient {
        async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
            self.query_tagged("-", sql, params).await
        }

        async fn query_tagged(
            &self,
            tag: &str,
            sql: &str,
            params: &[&(dyn ToSql + Sync)],
        ) -> DbResult<Vec<Row>> {
            self.calls.lock().unwrap().push(Call {
                tag: tag.to_string(),
                sql: sql.to_string(),
                params: params.iter().map(|p| format!("{p:?}")).collect(),
            });
            Ok(vec![])
        }
    }

    // ── filter compiler ──

    #[test]
    fn empty_filter_compiles_to_nothing() {
        let w = JobFilter::new().where_clause();
        assert_eq!(w.to_sql(), "");
        assert!(w.params().is_empty());
    }

    #[test]
    fn filter_emits_predicates_in_fixed_order() {
        let w = JobFilter::new()
            .title("eng")
            .has_equity(true)
            .min_salary(250)
            .where_clause();
        assert_eq!(
            w.to_sql(),
            "WHERE salary >= $1 AND equity > 0 AND title ILIKE $2"
        );
        let params: Vec<String> = w.params().iter().map(|p| format!("{p:?}")).collect();
        assert_eq!(params, vec!["250", "\"%eng%\""]);
    }

    #[test]
    fn has_equity_false_is_same_as_absent() {
        let with_false = JobFilter::new().has_equity(false).where_clause();
        assert_eq!(with_false.to_sql(), JobFilter::new().where_clause().to_sql());

        let w = JobFilter::new().min_salary(1).has_equity(false).where_clause();
        assert_eq!(w.to_sql(), "WHERE salary >= $1");
    }

    #[test]
    fn title_alone_is_first_placeholder() {
        let w = JobFilter::new().title("Job").where_clause();
        assert_eq!(w.to_sql(), "WHERE title ILIKE $1");
    }

    #[test]
    fn filter_deserializes_leniently() {
        let f: JobFilter =
            serde_json::from_str(r#"{"minSalary": 250, "hasEquity": "true", "title": "j"}"#)
                .unwrap();
        assert_eq!(f.min_salary, Some(250));
        assert_eq!(f.has_equity, None);
        assert_eq!(f.title.as_deref(), Some("j"));

        let f: JobFilter = serde_json::from_str(r#"{"hasEquity": 1}"#).unwrap();
        assert_eq!(f.has_equity, None);
        let f: JobFilter = serde_json::from_str(r#"{"hasEquity": true}"#).unwrap();
        assert_eq!(f.has_equity, Some(true));
        let f: JobFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(f, JobFilter::default());
    }

    // ── update payload ──

    #[test]
    fn update_map_follows_field_order() {
        let data = JobUpdate::new()
            .equity(Some(Decimal::new(5, 1)))
            .title("New")
            .salary(Some(500));
        let map = data.to_update_map();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["title", "salary", "equity"]);
        assert!(!data.is_empty());
        assert!(JobUpdate::new().is_empty());
    }

    #[test]
    fn update_deserialization_enforces_whitelist() {
        let err = serde_json::from_str::<JobUpdate>(r#"{"companyHandle": "c2"}"#);
        assert!(err.is_err());
        let err = serde_json::from_str::<JobUpdate>(r#"{"id": 3}"#);
        assert!(err.is_err());
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let data: JobUpdate = serde_json::from_str(r#"{"salary": null}"#).unwrap();
        assert_eq!(data.salary, Some(None));
        assert_eq!(data.equity, None);
        assert_eq!(data.to_update_map().keys().collect::<Vec<_>>(), vec!["salary"]);

        let data: JobUpdate = serde_json::from_str(r#"{"equity": "0.25"}"#).unwrap();
        assert_eq!(data.equity, Some(Some(Decimal::new(25, 2))));
    }

    #[test]
    fn null_title_is_rejected_not_dropped() {
        let data: JobUpdate = serde_json::from_str(r#"{"title": null, "salary": 5}"#).unwrap();
        assert_eq!(data.title, Some(None));
        let err = data.validate().unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("title must not be null"));

        let data: JobUpdate = serde_json::from_str(r#"{"title": null}"#).unwrap();
        assert!(!data.is_empty());
        assert!(data.validate().unwrap_err().to_string().contains("title must not be null"));
    }

    #[tokio::test]
    async fn update_with_null_title_runs_no_sql() {
        let client = RecordingClient::default();
        let data: JobUpdate = serde_json::from_str(r#"{"title": null, "salary": 5}"#).unwrap();
        let err = Job::update(&client, 3, &data).await.unwrap_err();
        assert!(err.is_invalid_input());
        assert!(client.calls().is_empty());
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        assert!(
            JobUpdate::new()
                .equity(Some(Decimal::new(15, 1)))
                .validate()
                .unwrap_err()
                .is_invalid_input()
        );
        assert!(JobUpdate::new().salary(Some(-1)).validate().is_err());
        assert!(JobUpdate::new().title("  ").validate().is_err());
        assert!(JobUpdate::new().salary(None).equity(None).validate().is_ok());
    }

    // ── CRUD against a recording client ──

    #[tokio::test]
    async fn find_all_without_filter_orders_by_title() {
        let conn = RecordingClient::default();
        let jobs = Job::find_all(&conn, &JobFilter::default()).await.unwrap();
        assert!(jobs.is_empty());

        let calls = conn.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tag, "jobs.find_all");
        assert_eq!(calls[0].sql, format!("{FIND_ALL_SQL} ORDER BY title"));
        assert!(calls[0].params.is_empty());
    }

    #[tokio::test]
    async fn find_all_appends_where_before_order() {
        let conn = RecordingClient::default();
        let filter = JobFilter::new().min_salary(250).has_equity(true).title("dev");
        Job::find_all(&conn, &filter).await.unwrap();

        let calls = conn.calls();
        assert_eq!(
            calls[0].sql,
            format!(
                "{FIND_ALL_SQL} WHERE salary >= $1 AND equity > 0 AND title ILIKE $2 ORDER BY title"
            )
        );
        assert_eq!(calls[0].params, vec!["250", "\"%dev%\""]);
    }

    #[tokio::test]
    async fn get_missing_job_is_not_found() {
        let conn = RecordingClient::default();
        let err = Job::get(&conn, 7).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: No job: 7");

        // The company lookup is never attempted.
        let calls = conn.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].sql,
            "SELECT id, title, salary, equity, company_handle FROM jobs WHERE id = $1"
        );
        assert_eq!(calls[0].params, vec!["7"]);
    }

    #[tokio::test]
    async fn update_places_id_after_set_values() {
        let conn = RecordingClient::default();
        let data = JobUpdate::new()
            .title("New")
            .salary(Some(500))
            .equity(Some(Decimal::new(5, 1)));
        let err = Job::update(&conn, 3, &data).await.unwrap_err();
        assert!(err.is_not_found());

        let calls = conn.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].sql,
            "UPDATE jobs SET \"title\"=$1, \"salary\"=$2, \"equity\"=$3 WHERE id = $4 \
             RETURNING id, title, salary, equity, company_handle"
        );
        assert_eq!(calls[0].params, vec!["\"New\"", "Some(500)", "Some(0.5)", "3"]);
    }

    #[tokio::test]
    async fn update_single_field_uses_second_placeholder_for_id() {
        let conn = RecordingClient::default();
        let _ = Job::update(&conn, 9, &JobUpdate::new().salary(None)).await;

        let calls = conn.calls();
        assert!(calls[0].sql.starts_with("UPDATE jobs SET \"salary\"=$1 WHERE id = $2 "));
        assert_eq!(calls[0].params, vec!["None", "9"]);
    }

    #[tokio::test]
    async fn update_with_no_fields_sends_nothing() {
        let conn = RecordingClient::default();
        let err = Job::update(&conn, 1, &JobUpdate::default()).await.unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(err.to_string(), "Invalid input: No data");
        assert!(conn.calls().is_empty());
    }

    #[tokio::test]
    async fn remove_missing_job_is_not_found() {
        let conn = RecordingClient::default();
        let err = Job::remove(&conn, 0).await.unwrap_err();
        assert!(err.is_not_found());

        let calls = conn.calls();
        assert_eq!(calls[0].tag, "jobs.remove");
        assert_eq!(calls[0].sql, "DELETE FROM jobs WHERE id = $1 RETURNING id");
    }

    #[tokio::test]
    async fn create_validates_before_sending() {
        let conn = RecordingClient::default();
        let data = NewJob {
            title: "Test".to_string(),
            salary: Some(70000),
            equity: Some(Decimal::new(2, 0)),
            company_handle: "c1".to_string(),
        };
        assert!(Job::create(&conn, &data).await.unwrap_err().is_invalid_input());
        assert!(conn.calls().is_empty());
    }

    #[test]
    fn job_serializes_with_camel_case_keys() {
        let job = Job {
            id: 1,
            title: "Test".to_string(),
            salary: Some(70000),
            equity: Some(Decimal::new(5, 1)),
            company_handle: "c1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&job).unwrap(),
            serde_json::json!({
                "id": 1,
                "title": "Test",
                "salary": 70000,
                "equity": "0.5",
                "companyHandle": "c1"
            })
        );
    }

    #[test]
    fn new_job_deserializes_from_camel_case() {
        let data: NewJob = serde_json::from_str(
            r#"{"companyHandle": "c1", "title": "Test", "salary": 70000, "equity": "0.5"}"#,
        )
        .unwrap();
        assert_eq!(data.company_handle, "c1");
        assert_eq!(data.equity, Some(Decimal::new(5, 1)));
        assert!(data.validate().is_ok());
    }
}
