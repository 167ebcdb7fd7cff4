use serde_json::Value;

/// Why a payload looks like QA fixture data rather than a real record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDataMatch {
    pub field: String,
    pub reason: &'static str,
}

/// Heuristic check for obvious test fixtures in a write payload.
///
/// Flags an email-like key containing "test@", an id-like key containing
/// "TEST", or a name-like key containing "test". Nested objects and arrays
/// are inspected. Returns the first match.
pub fn looks_like_test_data(payload: &Value) -> Option<TestDataMatch> {
    match payload {
        Value::Object(map) => map.iter().find_map(|(key, value)| {
            if let Value::String(text) = value {
                check_field(key, text)
            } else {
                looks_like_test_data(value)
            }
        }),
        Value::Array(items) => items.iter().find_map(looks_like_test_data),
        _ => None,
    }
}

fn check_field(key: &str, text: &str) -> Option<TestDataMatch> {
    let lower_key = key.to_ascii_lowercase();
    let hit = |reason| {
        Some(TestDataMatch {
            field: key.to_string(),
            reason,
        })
    };

    if lower_key.contains("email") && text.to_ascii_lowercase().contains("test@") {
        return hit("email contains 'test@'");
    }
    if is_id_key(key) && text.contains("TEST") {
        return hit("id contains 'TEST'");
    }
    if lower_key.contains("name") && text.to_ascii_lowercase().contains("test") {
        return hit("name contains 'test'");
    }
    None
}

/// `id`, `ID`, `leadId`, `lead_id`, `Record ID`.
fn is_id_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    lower == "id" || lower.ends_with("_id") || lower.ends_with(" id") || key.ends_with("Id")
}
