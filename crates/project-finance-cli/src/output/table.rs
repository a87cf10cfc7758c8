use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::format_scalar;

/// Format output as tables using the tabled crate.
///
/// Scalar fields of the result go in a Field/Value table. Arrays of
/// records (CFADS rows, IDC schedule, violations) and nested sections
/// (debt, coverage, covenant checks) get their own titled tables.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_section(None, result);
                print_envelope_notes(map);
            } else {
                print_section(None, value);
            }
        }
        Value::Array(arr) => print_records(arr),
        _ => println!("{}", value),
    }
}

fn print_section(title: Option<&str>, value: &Value) {
    let Value::Object(map) = value else {
        if let Some(t) = title {
            println!("\n{}: {}", t, format_cell(value));
        } else {
            println!("{}", format_cell(value));
        }
        return;
    };

    if let Some(t) = title {
        println!("\n{}", t);
    }

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut nested = Vec::new();
    for (key, val) in map {
        match val {
            Value::Object(_) => nested.push((key, val)),
            Value::Array(arr) if arr.first().is_some_and(Value::is_object) => nested.push((key, val)),
            _ => builder.push_record([key.as_str(), &format_cell(val)]),
        }
    }
    println!("{}", Table::from(builder));

    for (key, val) in nested {
        let heading = match title {
            Some(t) => format!("{t}.{key}"),
            None => key.clone(),
        };
        match val {
            Value::Array(arr) => {
                println!("\n{}", heading);
                print_records(arr);
            }
            _ => print_section(Some(heading.as_str()), val),
        }
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_records(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_cell).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_cell(item));
        }
    }
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_cell).collect();
            items.join(", ")
        }
        _ => format_scalar(value),
    }
}
