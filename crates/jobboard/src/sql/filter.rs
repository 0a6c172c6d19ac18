use crate::param::ParamList;
use tokio_postgres::types::ToSql;

/// Builder for an optional `WHERE` clause made of `AND`-joined predicates.
///
/// Predicates are emitted in the order they are added. A predicate that binds a
/// value gets the placeholder `$n`, where `n` is the value's position in the
/// bind list at the moment it was pushed.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct WhereClause {
    predicates: Vec<String>,
    params: ParamList,
}

impl WhereClause {
    /// Create an empty clause (renders as the empty string).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate with no bound value, e.g. `equity > 0`.
    pub fn and(&mut self, predicate: &str) -> &mut Self {
        self.predicates.push(predicate.to_string());
        self
    }

    /// Bind `value` and add `<lhs> $n`, e.g. `and_bind("salary >=", 250)`.
    pub fn and_bind<T>(&mut self, lhs: &str, value: T) -> &mut Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        let idx = self.params.push(value);
        self.predicates.push(format!("{lhs} ${idx}"));
        self
    }

    /// Whether no predicate has been added.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Number of predicates.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Render `WHERE p1 AND p2 ...`, or `""` when there are no predicates.
    pub fn to_sql(&self) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }
        format!("WHERE {}", self.predicates.join(" AND "))
    }

    /// Append the rendered clause to `sql`, separated by a space.
    ///
    /// Does nothing when there are no predicates.
    pub fn append_to(&self, sql: &mut String) {
        if self.predicates.is_empty() {
            return;
        }
        sql.push(' ');
        sql.push_str(&self.to_sql());
    }

    /// Bound values in placeholder order.
    pub fn params(&self) -> &ParamList {
        &self.params
    }

    /// Split into the rendered clause and its bound values.
    pub fn into_parts(self) -> (String, ParamList) {
        (self.to_sql(), self.params)
    }
}
