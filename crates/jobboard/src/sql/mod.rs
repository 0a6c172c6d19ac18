//! Dynamic clause compilers.
//!
//! Both compilers are pure: they take sparse input and return a clause string
//! plus the ordered list of values bound to its `$1, $2, ...` placeholders.
//! A placeholder's number is always the length of the value list right after
//! its value was pushed, so numbering is contiguous and matches bind order.
//!
//! - [`WhereClause`] accumulates optional `AND`-joined predicates.
//! - [`sql_for_partial_update`] turns an [`UpdateMap`] into a `SET` list.
//!
//! # Example
//!
//! ```ignore
//! use jobboard::sql::{ColumnMap, UpdateMap, WhereClause, sql_for_partial_update};
//!
//! let mut w = WhereClause::new();
//! w.and_bind("salary >=", 250_i32).and("equity > 0");
//! assert_eq!(w.to_sql(), "WHERE salary >= $1 AND equity > 0");
//!
//! let set = sql_for_partial_update(
//!     &UpdateMap::new().set("numEmployees", 10_i32),
//!     &ColumnMap::new().map("numEmployees", "num_employees"),
//! )?;
//! assert_eq!(set.to_sql(), r#""num_employees"=$1"#);
//! ```

mod filter;
mod partial_update;


pub use filter::WhereClause;
pub use partial_update::{ColumnMap, SetClause, UpdateMap, sql_for_partial_update};
