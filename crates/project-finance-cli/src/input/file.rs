use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a scenario file as a generic serde_json::Value. `.yaml` and `.yml`
/// files are parsed as YAML, everything else as JSON with a YAML fallback.
pub fn read_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let is_yaml = canonical
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let parsed: Result<Value, Box<dyn std::error::Error>> = if is_yaml {
        serde_yaml::from_str(&contents).map_err(|e| e.to_string().into())
    } else {
        super::parse_document(&contents)
    };
    parsed.map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

/// Resolve and validate the path.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
