use serde_json::{json, Map, Value};

/// Infer a JSON Schema fragment from an example value.
///
/// Arrays take their item schema from the first element; empty arrays and
/// nulls produce an unconstrained schema.
pub fn infer_schema(example: &Value) -> Value {
    match example {
        Value::Null => json!({}),
        Value::Bool(_) => json!({"type": "boolean"}),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({"type": "integer"}),
        Value::Number(_) => json!({"type": "number"}),
        Value::String(_) => json!({"type": "string"}),
        Value::Array(items) => {
            let item_schema = items.first().map(infer_schema).unwrap_or_else(|| json!({}));
            json!({"type": "array", "items": item_schema})
        }
        Value::Object(fields) => {
            let properties: Map<String, Value> = fields
                .iter()
                .map(|(key, value)| (key.clone(), infer_schema(value)))
                .collect();
            json!({"type": "object", "properties": properties})
        }
    }
}

/// Interpret a Postman parameter value (always a string) as the closest JSON scalar.
pub fn typed_example(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::String(raw.to_string());
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if float.is_finite() {
            return Value::from(float);
        }
    }
    match trimmed {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}
