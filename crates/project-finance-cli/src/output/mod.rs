pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result` object of an output envelope, or the value itself.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Per-period table carried by a result: CFADS rows (post-shield first)
/// for CFADS and evaluation output.
pub(crate) fn period_rows(result: &Value) -> Option<&Vec<Value>> {
    let candidates = [
        result.pointer("/post_shield/rows"),
        result.pointer("/pre_shield/rows"),
        result.get("rows"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_array())
}

pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
