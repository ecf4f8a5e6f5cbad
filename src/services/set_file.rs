//! Bidirectional codec for the platform's `.set` preset files: one
//! `name=value||type||` line per parameter behind a short comment header.

use chrono::Utc;
use tracing::info;

use crate::models::report::{ParamMap, ParamValue};

pub fn generate_set_file(parameters: &ParamMap, preset_name: &str) -> String {
    let mut lines = vec![
        format!(
            "; saved automatically on {}",
            Utc::now().format("%Y.%m.%d %H:%M:%S")
        ),
        format!(
            "; this file contains last used input parameters for testing/optimizing {preset_name} expert advisor"
        ),
        ";".to_string(),
    ];

    for (name, value) in parameters {
        let (value_str, type_tag) = match value {
            ParamValue::Bool(v) => (v.to_string(), "bool"),
            ParamValue::Int(v) => (v.to_string(), "int"),
            ParamValue::Float(v) => (format!("{v:.8}"), "double"),
            ParamValue::Text(v) => (v.clone(), "string"),
        };
        lines.push(format!("{name}={value_str}||{type_tag}||"));
    }

    info!(
        "Generated .set file with {} parameters for preset {}",
        parameters.len(),
        preset_name
    );
    lines.join("\n")
}

/// Skips blank lines and `;` comments; splits each remaining line on the
/// first `=`, then the value segment on `||`. A missing type tag defaults to
/// `string`; unknown tags and failed conversions degrade rather than error.
pub fn parse_set_file(content: &str) -> ParamMap {
    let mut parameters = ParamMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        let Some((name, rest)) = line.split_once('=') else {
            continue;
        };

        let mut segments = rest.split("||");
        let value_str = segments.next().unwrap_or_default().trim();
        let type_tag = segments.next().unwrap_or("string").trim();

        let value = match type_tag {
            "bool" => ParamValue::Bool(value_str.eq_ignore_ascii_case("true")),
            "int" => ParamValue::Int(value_str.parse().unwrap_or(0)),
            "double" => ParamValue::Float(value_str.parse().unwrap_or(0.0)),
            _ => ParamValue::Text(value_str.to_string()),
        };
        parameters.insert(name.trim().to_string(), value);
    }

    info!("Parsed .set file with {} parameters", parameters.len());
    parameters
}

/// Download filename for a preset: anything outside `[A-Za-z0-9_-]` becomes
/// an underscore, with a `.set` extension appended.
pub fn sanitize_filename(preset_name: &str) -> String {
    let base: String = preset_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let base = if base.is_empty() {
        "preset".to_string()
    } else {
        base
    };
    format!("{base}.set")
}
