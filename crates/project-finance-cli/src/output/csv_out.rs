use serde_json::{Map, Value};
use std::io;

use super::{format_scalar, period_rows, result_of};

/// Write output as CSV to stdout.
///
/// Results carrying CFADS rows are written one row per period. Otherwise
/// equal-length series in the result (balances, service, interest) become
/// period columns, and a result with no series falls back to field/value.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let result = result_of(value);

    if let Some(rows) = period_rows(result) {
        write_records(&mut wtr, rows);
    } else if let Value::Object(map) = result {
        let series = parallel_series(map);
        if series.len() >= 2 {
            write_series(&mut wtr, &series);
        } else {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in map {
                let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
            }
        }
    } else if let Value::Array(arr) = result {
        write_records(&mut wtr, arr);
    } else {
        let _ = wtr.write_record([&format_scalar(result)]);
    }

    let _ = wtr.flush();
}

/// Scalar arrays of the longest length found in the result.
fn parallel_series(map: &Map<String, Value>) -> Vec<(&str, &Vec<Value>)> {
    let scalar_arrays: Vec<(&str, &Vec<Value>)> = map
        .iter()
        .filter_map(|(k, v)| v.as_array().map(|a| (k.as_str(), a)))
        .filter(|(_, a)| !a.is_empty() && a.iter().all(|x| !x.is_object() && !x.is_array()))
        .collect();
    let longest = scalar_arrays.iter().map(|(_, a)| a.len()).max().unwrap_or(0);
    scalar_arrays
        .into_iter()
        .filter(|(_, a)| a.len() == longest)
        .collect()
}

fn write_series(wtr: &mut csv::Writer<io::StdoutLock<'_>>, series: &[(&str, &Vec<Value>)]) {
    let mut headers = vec!["period"];
    headers.extend(series.iter().map(|(k, _)| *k));
    let _ = wtr.write_record(&headers);

    let len = series.first().map(|(_, a)| a.len()).unwrap_or(0);
    for t in 0..len {
        let mut row = vec![t.to_string()];
        row.extend(series.iter().map(|(_, a)| format_scalar(&a[t])));
        let _ = wtr.write_record(&row);
    }
}

fn write_records(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_scalar(item)]);
        }
    }
}
