//! sql-check: Compile-time SQL query validation against a schema file.
//!
//! Unlike SQLx (which requires a running Postgres instance at compile time),
//! sql-check validates queries against a schema file dumped from the database.

pub mod ast;
pub mod columns;
pub mod error;
pub mod infer;
pub mod model;
pub mod nullsafety;
pub mod params;
pub mod probe;
pub mod rowcount;
pub mod schema;
pub mod scope;
pub mod types;
pub mod validate;
pub mod visitor;

#[cfg(feature = "runtime")]
pub mod runtime;

#[cfg(feature = "sqlx-runtime")]
pub mod sqlx_runtime;

pub use error::{Error, Result};
pub use model::{ColumnDescr, ParamDescr, StatementDescription};
pub use rowcount::RowCount;
pub use schema::{Column, Schema, Table};
pub use types::{column_rust_type, PostgresType, RustType};
pub use validate::validate_query;

#[cfg(feature = "runtime")]
pub use runtime::{Query, QueryWithParams};

#[cfg(feature = "sqlx-runtime")]
pub use sqlx_runtime::{Query as SqlxQuery, SqlxQueryBuilder};
