use serde_json::Value;

use super::{format_scalar, result_of};

/// Print just the headline value from the output.
///
/// Looks for well-known fields in order of priority, first on the result
/// and then on its `debt`, `coverage` and `pre_shield` sections, then falls
/// back to the first scalar field of the result.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    let priority_keys = [
        "audit_status",
        "dscr_min",
        "llcr_min",
        "plcr_min",
        "total_cfads_usd",
    ];

    let sections: Vec<&Value> = std::iter::once(result)
        .chain(["debt", "coverage", "pre_shield"].iter().filter_map(|k| result.get(*k)))
        .collect();

    for key in &priority_keys {
        for section in &sections {
            if let Some(val) = section.get(*key) {
                if !val.is_null() {
                    println!("{}: {}", key, format_scalar(val));
                    return;
                }
            }
        }
    }

    if let Value::Object(map) = result {
        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_object() && !v.is_array()) {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result));
}
