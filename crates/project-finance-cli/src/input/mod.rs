pub mod file;
pub mod stdin;

use serde_json::Value;

/// Parse a document as JSON, falling back to YAML.
pub fn parse_document(contents: &str) -> Result<Value, Box<dyn std::error::Error>> {
    match serde_json::from_str(contents) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str(contents)
            .map_err(|yaml_err| format!("not valid JSON ({json_err}) or YAML ({yaml_err})").into()),
    }
}

/// Read the scenario document from `--input` or piped stdin.
pub fn read_value(path: Option<&str>, what: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_value(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(data)
    } else {
        Err(format!("--input <file.json|file.yaml> or stdin required for {what}").into())
    }
}
