//! Elixir Term Conversion Utilities
//!
//! Rows become lists of binaries (or `nil` for absent values); errors become
//! `{:error, {kind, message}}`.

use crate::error::ExtractError;
use crate::rules::Row;
use rustler::{Atom, Encoder, Env, NewBinary, Term};

rustler::atoms! {
    ok,
    error,
    truncated_input,
    malformed_structure,
    rule_configuration,
    io,
    sink,
    aborted,
}

/// Create a binary term from a string
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

/// Convert one row to a list of binaries and `nil`s
pub fn row_to_term<'a>(env: Env<'a>, row: &Row) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for value in row.values.iter().rev() {
        let term = match value {
            Some(s) => str_to_binary(env, s),
            None => rustler::types::atom::nil().encode(env),
        };
        list = list.list_prepend(term);
    }
    list
}

/// Convert rows to a list of row lists, preserving order
pub fn rows_to_term<'a>(env: Env<'a>, rows: &[Row]) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for row in rows.iter().rev() {
        list = list.list_prepend(row_to_term(env, row));
    }
    list
}

fn kind_atom(err: &ExtractError) -> Atom {
    match err {
        ExtractError::TruncatedInput { .. } => truncated_input(),
        ExtractError::MalformedStructure { .. } => malformed_structure(),
        ExtractError::RuleConfiguration(_) => rule_configuration(),
        ExtractError::Io(_) => io(),
        ExtractError::Sink(_) => sink(),
        ExtractError::Aborted => aborted(),
    }
}

/// `{kind, message}`
pub fn error_reason<'a>(env: Env<'a>, err: &ExtractError) -> Term<'a> {
    (kind_atom(err), str_to_binary(env, &err.to_string())).encode(env)
}

/// `{:error, {kind, message}}`
pub fn error_to_term<'a>(env: Env<'a>, err: &ExtractError) -> Term<'a> {
    (error(), error_reason(env, err)).encode(env)
}
