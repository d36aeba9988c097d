//! NULL-safety classification for operators and functions.
//!
//! Mirrors Postgres's own notion of a "strict" function (NULL in, NULL out)
//! plus the handful of built-ins that are not strict in that sense. The
//! categories are deliberately coarse — four buckets, not a per-function
//! truth table of every overload — because the analyzer only needs to know
//! whether a NULL operand *can* leak into the result, not compute the exact
//! result.

use crate::ast::{BinaryOperator, UnaryOperator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Result is nullable iff at least one operand is nullable (Postgres's "strict").
    Safe,
    /// Result may be NULL even when every operand is non-null (e.g. `SUM` over
    /// zero rows, `NULLIF(a, a)`).
    Unsafe,
    /// Result is always NULL regardless of operands. No current table entry maps
    /// here; kept so a future unsupported construct can be pinned down precisely
    /// instead of guessed at via `Unsafe`.
    AlwaysNull,
    /// Result is never NULL regardless of operands (e.g. `IS NULL`, `COUNT(*)`).
    NeverNull,
}

pub fn unary_category(op: UnaryOperator) -> Category {
    match op {
        UnaryOperator::Not | UnaryOperator::Plus | UnaryOperator::Minus => Category::Safe,
        UnaryOperator::IsNull
        | UnaryOperator::IsNotNull
        | UnaryOperator::IsTrue
        | UnaryOperator::IsFalse
        | UnaryOperator::IsNotTrue
        | UnaryOperator::IsNotFalse
        | UnaryOperator::IsUnknown
        | UnaryOperator::IsNotUnknown => Category::NeverNull,
    }
}

pub fn binary_category(op: &BinaryOperator) -> Category {
    match op {
        BinaryOperator::Arithmetic | BinaryOperator::Comparison | BinaryOperator::Concat => {
            Category::Safe
        }
        BinaryOperator::Like => Category::Safe,
        // Three-valued AND/OR logic (`NULL AND false = false`) is not modeled precisely;
        // approximating as Safe (nullable iff either side is) is conservative enough for
        // the WHERE-clause refinement pass, which only ever descends through AND anyway.
        BinaryOperator::And | BinaryOperator::Or => Category::Safe,
        BinaryOperator::Custom(_) => Category::Unsafe,
    }
}

pub fn function_category(name: &str) -> Category {
    match name {
        "count" => Category::NeverNull,
        "sum" | "avg" | "min" | "max" => Category::Unsafe,
        // COALESCE's true rule is "nullable iff every argument is nullable"; the four-bucket
        // model can't express that, so treat it as NeverNull, matching its overwhelmingly
        // common use (supplying a non-null fallback).
        "coalesce" => Category::NeverNull,
        "nullif" => Category::Unsafe,
        "now" | "current_date" | "current_time" | "current_timestamp" | "localtimestamp"
        | "localtime" => Category::NeverNull,

        "upper" | "lower" | "initcap" | "concat" | "concat_ws" | "substring" | "substr"
        | "left" | "right" | "trim" | "ltrim" | "rtrim" | "btrim" | "replace" | "translate"
        | "reverse" | "repeat" | "lpad" | "rpad" | "split_part" | "overlay" | "format"
        | "quote_ident" | "quote_literal" | "quote_nullable" | "encode" | "decode" | "md5"
        | "sha256" | "sha384" | "sha512" | "to_hex" | "chr" | "regexp_replace"
        | "regexp_substr" | "regexp_match" | "length" | "char_length" | "character_length"
        | "octet_length" | "bit_length" | "position" | "strpos" | "ascii" | "extract"
        | "date_part" | "date_trunc" | "age" | "to_char" | "to_date" | "to_timestamp"
        | "make_date" | "make_time" | "make_timestamp" | "make_timestamptz" | "make_interval" => {
            Category::Safe
        }

        // Unrecognized function: the conservative choice per the degrade-to-nullable
        // policy for constructs this analyzer doesn't have a specific rule for.
        _ => Category::Unsafe,
    }
}
