//! Dynamic value bridge
//!
//! Parsers hand the tree a generic [`Value`]: null, scalars, arrays and
//! string-keyed objects. Arrays are never examined and end up as opaque leaves.

pub use serde_json::Value;

/// Convert a parsed TOML document into the dynamic representation.
///
/// Datetimes become strings; floats that JSON cannot represent (NaN, inf)
/// become null.
pub fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, from_toml(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_toml_nested_table() {
        let parsed: toml::Value = toml::from_str(
            r#"
name = "svc"
port = 8080
ratio = 0.5
tags = ["a", "b"]

[db]
host = "localhost"
"#,
        )
        .unwrap();

        assert_eq!(
            from_toml(parsed),
            json!({
                "name": "svc",
                "port": 8080,
                "ratio": 0.5,
                "tags": ["a", "b"],
                "db": {"host": "localhost"}
            })
        );
    }

    #[test]
    fn test_from_toml_datetime_becomes_string() {
        let parsed: toml::Value = toml::from_str("at = 1979-05-27T07:32:00Z").unwrap();
        assert_eq!(from_toml(parsed), json!({"at": "1979-05-27T07:32:00Z"}));
    }

    #[test]
    fn test_from_toml_nan_becomes_null() {
        assert_eq!(from_toml(toml::Value::Float(f64::NAN)), Value::Null);
    }
}
