//! S-expression plist helpers shared by configuration and trace parsing.

use lexpr::Value;

use crate::error::GestureError;

/// Parse a single s-expression.
pub fn parse(raw: &str) -> Result<Value, GestureError> {
    lexpr::from_str(raw).map_err(|e| GestureError::Sexp(e.to_string()))
}

/// Find the value following `:key` in a plist.
/// Handles both `Value::Keyword("key")` (elisp parser) and
/// `Value::Symbol(":key")` (default parser) forms.
pub fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Extract a keyword value from a plist as a string.
pub fn get_keyword(value: &Value, key: &str) -> Option<String> {
    get_value(value, key).and_then(atom_to_string)
}

/// Extract a floating-point value from a plist.
pub fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_value(value, key).and_then(as_f64)
}

/// Extract a boolean value from a plist.
/// Treats "t" as true, "nil" as false.
pub fn get_bool(value: &Value, key: &str) -> Option<bool> {
    get_keyword(value, key).map(|s| s != "nil" && s != "#f" && s != "false")
}

/// Numeric atom as f64.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Elements of a proper list.  Non-list values yield an empty vector.
pub fn list_items(value: &Value) -> Vec<&Value> {
    let mut items = Vec::new();
    let mut current = value;
    while let Value::Cons(pair) = current {
        items.push(pair.car());
        current = pair.cdr();
    }
    items
}

/// Render an atom as a bare string (symbols lose a leading colon).
pub fn atom_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Keyword(v) => Some(v.to_string()),
        Value::Symbol(v) => {
            let s = v.to_string();
            Some(s.strip_prefix(':').unwrap_or(&s).to_string())
        }
        Value::String(v) => Some(v.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "t" } else { "nil" }.to_string()),
        Value::Null | Value::Nil => Some("nil".to_string()),
        _ => None,
    }
}

/// Format a boolean the way elisp reads it.
pub fn bool_str(b: bool) -> &'static str {
    if b {
        "t"
    } else {
        "nil"
    }
}
