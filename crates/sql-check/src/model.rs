//! The enriched description of a statement that the rest of the crate (and
//! the `query!` macro downstream) consumes: output columns with nullability,
//! positional parameters with nullability, and a row-count estimate.

use crate::rowcount::RowCount;
use crate::types::PostgresType;

/// One output column, as understood after inference.
#[derive(Debug, Clone)]
pub struct ColumnDescr {
    pub name: String,
    pub data_type: PostgresType,
    pub nullable: bool,
    /// Only meaningful when `data_type` is `PostgresType::Array(_)`: whether
    /// the array's elements can themselves be `NULL`.
    pub elem_nullable: Option<bool>,
}

/// One positional parameter (`$1`, `$2`, ...).
#[derive(Debug, Clone)]
pub struct ParamDescr {
    /// 1-based, matching the `$N` it was bound from.
    pub index: usize,
    pub data_type: PostgresType,
    pub nullable: bool,
}

/// The fully enriched description of a statement: its probed shape refined
/// with nullability and row-count information.
#[derive(Debug, Clone)]
pub struct StatementDescription {
    pub columns: Vec<ColumnDescr>,
    pub params: Vec<ParamDescr>,
    pub row_count: RowCount,
}
