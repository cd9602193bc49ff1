use serde_json::{json, Value};

/// Project a saved payload down to the fields shown in list views.
///
/// Pure function of the stored data; collector payloads may be missing any
/// key, so absent fields come back as null rather than failing.
pub fn preview(data: &Value) -> Value {
    json!({
        "ipv4": data.pointer("/addresses/ipv4").cloned().unwrap_or(Value::Null),
        "city": data.pointer("/geolocation/city").cloned().unwrap_or(Value::Null),
    })
}
