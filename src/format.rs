//! Parameter serialization
//!
//! Turns a single query/form `Parameter` into its wire form according to its
//! collection format, and folds a whole map into a `k=v&k=v` string.

use indexmap::IndexMap;
use serde_json::Value;

use crate::request::{CollectionFormat, FilePart, ParamValue, Parameter};

/// Wire form of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Formatted {
    /// No value and empty values are not allowed; the key is omitted.
    Absent,
    Text(String),
    /// `multi` collection: one pair per element.
    Multi(Vec<String>),
    /// Booleans are passed through without string coercion.
    Bool(bool),
    File(FilePart),
}

/// Format one parameter value.
///
/// With `skip_encoding` strings pass through untouched and other scalars are
/// JSON-stringified; otherwise scalars are percent-encoded.
pub fn format_value(param: &Parameter, skip_encoding: bool) -> Formatted {
    let value = match &param.value {
        ParamValue::Undefined if param.allow_empty_value => return Formatted::Text(String::new()),
        ParamValue::Undefined => return Formatted::Absent,
        ParamValue::File(file) => return Formatted::File(file.clone()),
        ParamValue::Json(Value::Bool(b)) => return Formatted::Bool(*b),
        ParamValue::Json(v) => v,
    };

    let encode = |v: &Value| encode_scalar(v, skip_encoding);

    match value {
        // Objects have no scalar or array shape to serialize into.
        Value::Object(_) | Value::Null => Formatted::Text(String::new()),
        Value::Array(items) => {
            let encoded = items.iter().map(encode);
            match param.collection_format {
                None => Formatted::Text(encoded.collect::<Vec<_>>().join(",")),
                Some(CollectionFormat::Multi) => Formatted::Multi(encoded.collect()),
                Some(format) => {
                    let sep = format.separator().unwrap_or(",");
                    Formatted::Text(encoded.collect::<Vec<_>>().join(sep))
                }
            }
        }
        scalar => Formatted::Text(encode(scalar)),
    }
}

fn encode_scalar(value: &Value, skip_encoding: bool) -> String {
    match (value, skip_encoding) {
        (Value::String(s), true) => s.clone(),
        (other, true) => other.to_string(),
        (Value::String(s), false) => urlencoding::encode(s).into_owned(),
        (other, false) => urlencoding::encode(&other.to_string()).into_owned(),
    }
}

/// Encode a query or form map into `k=v` pairs joined by `&`.
///
/// Names are percent-encoded unless the parameter skips encoding. `multi`
/// arrays repeat the key once per element; absent values are dropped.
pub fn encode_form_or_query(data: &IndexMap<String, Parameter>) -> String {
    let mut pairs = Vec::with_capacity(data.len());
    for (name, param) in data {
        let key = if param.skip_encoding {
            name.clone()
        } else {
            urlencoding::encode(name).into_owned()
        };
        match format_value(param, param.skip_encoding) {
            Formatted::Absent => {}
            Formatted::Text(v) => pairs.push(format!("{key}={v}")),
            Formatted::Bool(b) => pairs.push(format!("{key}={b}")),
            Formatted::Multi(values) => {
                for v in values {
                    pairs.push(format!("{key}={v}"));
                }
            }
            Formatted::File(file) => {
                let name = file.file_name.unwrap_or_default();
                pairs.push(format!("{key}={}", urlencoding::encode(&name)));
            }
        }
    }
    pairs.join("&")
}
