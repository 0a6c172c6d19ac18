//! Quoted SQL identifiers.
//!
//! Postgres cannot bind identifiers as parameters, so column names that end up
//! in generated SQL are always rendered as quoted identifiers: wrapped in `"`
//! with embedded `"` escaped as `""`.

use crate::error::{DbError, DbResult};

/// A single quoted SQL identifier (a column name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    /// Create a quoted identifier.
    ///
    /// Any characters are allowed except NUL; the name must not be empty.
    pub fn quoted(name: &str) -> DbResult<Self> {
        if name.is_empty() {
            return Err(DbError::invalid_input("Empty quoted identifier"));
        }
        if name.contains('\0') {
            return Err(DbError::invalid_input(
                "Identifier cannot contain NUL character",
            ));
        }
        Ok(Self(name.to_string()))
    }

    /// The unquoted name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 2);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        out.push('"');
        for ch in self.0.chars() {
            if ch == '"' {
                out.push('"');
                out.push('"');
            } else {
                out.push(ch);
            }
        }
        out.push('"');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        let ident = Ident::quoted("salary").unwrap();
        assert_eq!(ident.to_sql(), r#""salary""#);
    }

    #[test]
    fn ident_keeps_case() {
        let ident = Ident::quoted("numEmployees").unwrap();
        assert_eq!(ident.to_sql(), r#""numEmployees""#);
    }

    #[test]
    fn ident_escapes_quote() {
        let ident = Ident::quoted(r#"has"quote"#).unwrap();
        assert_eq!(ident.to_sql(), r#""has""quote""#);
    }

    #[test]
    fn ident_neutralizes_injection() {
        let ident = Ident::quoted(r#"title"=1; DROP TABLE jobs; --"#).unwrap();
        assert_eq!(ident.to_sql(), r#""title""=1; DROP TABLE jobs; --""#);
    }

    #[test]
    fn ident_rejects_empty() {
        assert!(Ident::quoted("").unwrap_err().is_invalid_input());
    }

    #[test]
    fn ident_rejects_nul() {
        assert!(Ident::quoted("ti\0tle").is_err());
    }
}
