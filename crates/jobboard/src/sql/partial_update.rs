use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use crate::param::{Param, ParamList};
use std::collections::HashMap;
use tokio_postgres::types::ToSql;

/// Translation table from payload keys to SQL column names.
///
/// Keys without an entry resolve to themselves.
#[derive(Clone, Debug, Default)]
pub struct ColumnMap {
    columns: HashMap<String, String>,
}

impl ColumnMap {
    /// Create an empty map (every key resolves to itself).
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate `key` to `column`.
    pub fn map(mut self, key: impl Into<String>, column: impl Into<String>) -> Self {
        self.columns.insert(key.into(), column.into());
        self
    }

    /// Resolve a payload key to its SQL column name.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.columns.get(key).map(String::as_str).unwrap_or(key)
    }
}

impl<K, C> FromIterator<(K, C)> for ColumnMap
where
    K: Into<String>,
    C: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, C)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(k, c)| (k.into(), c.into()))
                .collect(),
        }
    }
}

/// Sparse, ordered set of column updates.
///
/// Entries keep the order in which keys were first set; setting a key again
/// replaces its value in place.
#[derive(Clone, Debug, Default)]
pub struct UpdateMap {
    entries: Vec<(String, Param)>,
}

impl UpdateMap {
    /// Create an empty update map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`.
    pub fn set<T>(mut self, key: impl Into<String>, value: T) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.insert(key, Param::new(value));
        self
    }

    /// Set `key` to `value` when it is `Some`; otherwise leave the key out.
    pub fn set_opt<T>(self, key: impl Into<String>, value: Option<T>) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    /// Insert a pre-wrapped value.
    pub fn insert(&mut self, key: impl Into<String>, value: Param) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key has been set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in update order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// A compiled `SET` list: `"col1"=$1, "col2"=$2, ...` plus its values.
///
/// Placeholders always start at `$1`. A caller that appends more parameters
/// (e.g. the row id for `WHERE id = $n`) continues from [`SetClause::next_index`].
#[derive(Clone, Debug)]
pub struct SetClause {
    sql: String,
    params: ParamList,
}

impl SetClause {
    /// The rendered assignment list.
    pub fn to_sql(&self) -> &str {
        &self.sql
    }

    /// Values in placeholder order.
    pub fn params(&self) -> &ParamList {
        &self.params
    }

    /// Number of assignments.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Always `false`: an empty update cannot be compiled.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Placeholder number for the first parameter appended after the assignments.
    pub fn next_index(&self) -> usize {
        self.params.next_index()
    }

    /// Split into the rendered list and its values.
    pub fn into_parts(self) -> (String, ParamList) {
        (self.sql, self.params)
    }
}

/// Compile a partial update into a `SET` assignment list.
///
/// Each key is translated through `columns`, quoted, and assigned the next
/// placeholder in the order of `data`.
///
/// Fails with [`DbError::InvalidInput`] when `data` is empty, before anything is
/// rendered.
pub fn sql_for_partial_update(data: &UpdateMap, columns: &ColumnMap) -> DbResult<SetClause> {
    if data.is_empty() {
        return Err(DbError::invalid_input("No data"));
    }

    let mut sql = String::new();
    let mut params = ParamList::new();
    for (key, value) in &data.entries {
        let column = Ident::quoted(columns.resolve(key))?;
        let idx = params.push_param(value.clone());
        if idx > 1 {
            sql.push_str(", ");
        }
        column.write_sql(&mut sql);
        sql.push_str("=$");
        sql.push_str(&idx.to_string());
    }

    Ok(SetClause { sql, params })
}
