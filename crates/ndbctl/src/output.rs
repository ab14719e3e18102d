use anyhow::Result;
use comfy_table::Table;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    #[default]
    Table,
}

impl From<crate::cli::OutputFormat> for OutputFormat {
    fn from(format: crate::cli::OutputFormat) -> Self {
        match format {
            crate::cli::OutputFormat::Json => OutputFormat::Json,
            crate::cli::OutputFormat::Yaml => OutputFormat::Yaml,
            crate::cli::OutputFormat::Auto | crate::cli::OutputFormat::Table => {
                OutputFormat::Table
            }
        }
    }
}

impl OutputFormat {
    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table)
    }
}

pub fn print_output<T: Serialize>(data: T, format: OutputFormat) -> Result<()> {
    let json_value = serde_json::to_value(data)?;
    println!("{}", render(&json_value, format)?);
    Ok(())
}

fn render(value: &Value, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Table => render_table(value),
    })
}

fn render_table(value: &Value) -> String {
    match value {
        Value::Array(arr) if !arr.is_empty() => {
            let mut table = Table::new();

            if let Value::Object(first) = &arr[0] {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(&headers);

                for item in arr {
                    if let Value::Object(obj) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| format_value(obj.get(h).unwrap_or(&Value::Null)))
                            .collect();
                        table.add_row(row);
                    }
                }
            } else {
                table.set_header(vec!["Value"]);
                for item in arr {
                    table.add_row(vec![format_value(item)]);
                }
            }

            table.to_string()
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["Field", "Value"]);

            for (key, val) in obj {
                table.add_row(vec![key.clone(), format_value(val)]);
            }

            table.to_string()
        }
        _ => format_value(value),
    }
}

/// Scalar rendering for table cells; short lists are inlined
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) if arr.iter().all(|v| !v.is_object() && !v.is_array()) => arr
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value_inlines_scalar_lists() {
        assert_eq!(format_value(&json!(["10.0.0.5", "10.0.0.6"])), "10.0.0.5, 10.0.0.6");
        assert_eq!(format_value(&json!([{"name": "a"}])), "[1 items]");
        assert_eq!(format_value(&Value::Null), "-");
    }

    #[test]
    fn test_render_object_as_field_table() {
        let rendered =
            render(&json!({"id": "srv-1", "status": "UP"}), OutputFormat::Table).unwrap();
        assert!(rendered.contains("Field"));
        assert!(rendered.contains("srv-1"));
        assert!(rendered.contains("UP"));
    }

    #[test]
    fn test_render_yaml() {
        let rendered = render(&json!({"id": "srv-1"}), OutputFormat::Yaml).unwrap();
        assert_eq!(rendered.trim(), "id: srv-1");
    }

    #[test]
    fn test_auto_maps_to_table() {
        assert!(OutputFormat::from(crate::cli::OutputFormat::Auto).is_table());
        assert_eq!(
            OutputFormat::from(crate::cli::OutputFormat::Json),
            OutputFormat::Json
        );
    }
}
