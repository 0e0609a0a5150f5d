use crate::core::errors::{CloudError, ProtocolErrorKind};
use serde_json::{Map, Value};

/// The logical body of a response, with the envelope removed.
pub type Payload = Map<String, Value>;

/// Key some deployments use for errors raised before command dispatch.
const GENERIC_ERROR_KEY: &str = "errorresponse";

/// `listNetworks` -> `listnetworksresponse`
pub fn response_key(operation: &str) -> String {
    format!("{}response", operation.to_lowercase())
}

/// Strip the `<operation>response` wrapper and classify provider errors.
///
/// The payload is returned as is; picking the resource key out of it
/// (`network`, `virtualmachine`, ...) is the caller's business.
pub fn unwrap(envelope: Value, operation: &str) -> Result<Payload, CloudError> {
    let Value::Object(mut outer) = envelope else {
        return Err(CloudError::protocol(
            ProtocolErrorKind::UnexpectedEnvelopeShape,
            format!("expected a JSON object for {}", operation),
        ));
    };

    let key = response_key(operation);
    let inner = match outer.remove(&key) {
        Some(inner) => inner,
        None => {
            let found = outer
                .keys()
                .find(|k| k.eq_ignore_ascii_case(&key))
                .cloned();
            match found.and_then(|k| outer.remove(&k)) {
                Some(inner) => inner,
                None => {
                    if let Some(Value::Object(generic)) = outer.get(GENERIC_ERROR_KEY) {
                        if let Some(err) = api_error(generic) {
                            return Err(err);
                        }
                    }
                    return Err(CloudError::protocol(
                        ProtocolErrorKind::UnexpectedEnvelopeShape,
                        format!(
                            "missing '{}', got keys [{}]",
                            key,
                            outer.keys().cloned().collect::<Vec<_>>().join(", ")
                        ),
                    ));
                }
            }
        }
    };

    let Value::Object(payload) = inner else {
        return Err(CloudError::protocol(
            ProtocolErrorKind::UnexpectedEnvelopeShape,
            format!("'{}' is not an object", key),
        ));
    };

    match api_error(&payload) {
        Some(err) => Err(err),
        None => Ok(payload),
    }
}

/// `ApiError` if the object carries `errorcode`/`errortext`.
pub fn api_error(object: &Payload) -> Option<CloudError> {
    if !object.contains_key("errorcode") && !object.contains_key("errortext") {
        return None;
    }
    let (code, text) = error_fields(object);
    Some(CloudError::Api { code, text })
}

/// Provider error code and text, tolerating numbers sent as strings.
pub fn error_fields(object: &Payload) -> (i64, String) {
    let code = object.get("errorcode").and_then(as_i64).unwrap_or_default();
    let text = match object.get("errortext") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    (code, text)
}

pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The `jobid` an asynchronous operation returns.
pub fn job_id(payload: &Payload) -> Option<String> {
    match payload.get("jobid")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
