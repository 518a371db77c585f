//! RecordXML - Streaming record extraction from very large XML documents
//!
//! Walks an XML stream once, builds one record subtree at a time, turns each
//! finished record into a row of column values through a rule set, then
//! releases the record before reading on. Memory stays bounded by the largest
//! record, whatever the size of the document.
//!
//! Host interface:
//! - push: `extractor_new` / `extractor_feed` / `extractor_take_rows` / `extractor_finish`
//! - pull: `extract_file` (XML file in, CSV file out)

// Allow dead code for library API not reached from the NIF surface
#![allow(dead_code)]

use rustler::{Binary, Encoder, Env, NifResult, ResourceArc, Term};
use std::path::Path;
use std::sync::Arc;

mod alloc;
mod core;
mod dom;
mod error;
mod path;
mod reader;
mod resource;
mod rules;
mod sink;
mod strategy;
mod term;

use error::ExtractError;
use resource::{ExtractorRef, ExtractorResource};
use rules::clinvar::clinvar_rules;
use rules::{Row, RuleSet};
use term::{error_reason, error_to_term, rows_to_term};

// ============================================================================
// Memory Tracking NIFs
// ============================================================================

#[rustler::nif]
fn get_rust_memory() -> usize {
    alloc::current()
}

#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    alloc::peak()
}

#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    alloc::reset()
}

// ============================================================================
// Push Extractor
// ============================================================================

fn new_extractor<'a>(env: Env<'a>, rules: Result<RuleSet, error::RuleConfigError>) -> Term<'a> {
    match rules {
        Ok(rules) => {
            let resource: ExtractorRef = ResourceArc::new(ExtractorResource::new(rules));
            (term::ok(), resource).encode(env)
        }
        Err(e) => error_to_term(env, &ExtractError::from(e)),
    }
}

/// Create an extractor from a JSON rule set
#[rustler::nif]
fn extractor_new<'a>(env: Env<'a>, rules_json: &str) -> NifResult<Term<'a>> {
    Ok(new_extractor(env, RuleSet::from_json(rules_json)))
}

/// Create an extractor with the reference ClinVar rules
#[rustler::nif]
fn extractor_new_clinvar<'a>(env: Env<'a>) -> NifResult<Term<'a>> {
    Ok(new_extractor(env, clinvar_rules()))
}

/// Column names in output order
#[rustler::nif]
fn extractor_columns(extractor: ExtractorRef) -> NifResult<Vec<String>> {
    let inner = extractor.lock()?;
    Ok(inner.columns().to_vec())
}

/// Feed a chunk of input; returns the number of bytes still buffered
#[rustler::nif]
fn extractor_feed<'a>(env: Env<'a>, extractor: ExtractorRef, chunk: Binary) -> NifResult<Term<'a>> {
    let mut inner = extractor.lock()?;
    Ok(match inner.feed(chunk.as_slice()) {
        Ok(buffered) => (term::ok(), buffered).encode(env),
        Err(e) => error_to_term(env, &e),
    })
}

/// Take up to `max` rows of completed records
#[rustler::nif]
fn extractor_take_rows<'a>(env: Env<'a>, extractor: ExtractorRef, max: usize) -> NifResult<Term<'a>> {
    let mut inner = extractor.lock()?;
    Ok(match inner.take_rows(max) {
        Ok(rows) => (term::ok(), rows_to_term(env, &rows)).encode(env),
        Err(e) => error_to_term(env, &e),
    })
}

/// End the input and return every remaining row
///
/// On failure the rows completed before it are returned alongside the error:
/// `{:error, {kind, message}, rows}`.
#[rustler::nif]
fn extractor_finish<'a>(env: Env<'a>, extractor: ExtractorRef) -> NifResult<Term<'a>> {
    let mut inner = extractor.lock()?;
    let mut rows: Vec<Row> = Vec::new();
    Ok(match inner.finish_into(&mut rows) {
        Ok(_) => (term::ok(), rows_to_term(env, &rows)).encode(env),
        Err(e) => (term::error(), error_reason(env, &e), rows_to_term(env, &rows)).encode(env),
    })
}

/// Get extractor status: {rows_emitted, buffered_bytes, retained_nodes, peak_retained_nodes}
#[rustler::nif]
fn extractor_status(extractor: ExtractorRef) -> NifResult<(u64, usize, usize, usize)> {
    let inner = extractor.lock()?;
    let stats = inner.stats();
    Ok((
        inner.rows_emitted(),
        inner.buffered_bytes(),
        stats.retained_nodes,
        stats.peak_retained_nodes,
    ))
}

// ============================================================================
// File Extraction
// ============================================================================

/// Extract an XML file into a CSV file; `nil` rules means the ClinVar rules
#[rustler::nif(schedule = "DirtyIo")]
fn extract_file<'a>(
    env: Env<'a>,
    input_path: String,
    output_path: String,
    rules_json: Option<String>,
) -> NifResult<Term<'a>> {
    let rules = match rules_json {
        Some(json) => RuleSet::from_json(&json),
        None => clinvar_rules(),
    };

    let result = rules
        .map_err(ExtractError::from)
        .and_then(|rules| strategy::extract_file(Path::new(&input_path), Path::new(&output_path), Arc::new(rules)));

    Ok(match result {
        Ok(summary) => (term::ok(), summary.records).encode(env),
        Err(e) => error_to_term(env, &e),
    })
}

// ============================================================================
// NIF Initialization
// ============================================================================

fn load(_env: Env, _info: Term) -> bool {
    true
}

rustler::init!("Elixir.RecordXML.Native", load = load);
