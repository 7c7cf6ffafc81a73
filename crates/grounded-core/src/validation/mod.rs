//! Request parsing and validation for the conversation endpoints.
//!
//! The body is walked as untyped JSON so that every violation can be reported
//! at once, with a path, instead of stopping at the first serde error.


use grounded_types::models::conversation::{MAX_MESSAGES, MAX_MESSAGE_CHARS};
use grounded_types::{ConversationRequest, Message, ModelProvider, Role, ValidationError, Violation};
use serde_json::{Map, Value};
use tracing::info;

/// Parse and validate an incoming request body.
///
/// Never panics and never short-circuits: all violations are collected and the
/// first one (in document order) names the error.
pub fn validate_request(body: &Value) -> Result<ConversationRequest, ValidationError> {
    let mut violations = Vec::new();

    let Some(obj) = body.as_object() else {
        violations.push(Violation::new("body", "must be a JSON object"));
        return Err(finish(violations));
    };

    let conversation_id = optional_string(obj, "conversationId", &mut violations);
    let messages = parse_messages(obj.get("messages"), &mut violations);
    let strict_mode = optional_bool(obj, "strictMode", &mut violations);
    let store_id = optional_string(obj, "storeId", &mut violations);
    let use_files = optional_bool(obj, "useFiles", &mut violations);
    let provider = parse_provider(obj.get("provider"), &mut violations);
    let api_key = optional_string(obj, "apiKey", &mut violations);
    let model = optional_string(obj, "model", &mut violations);

    if !violations.is_empty() {
        return Err(finish(violations));
    }

    info!("[Validator] Accepted request with {} messages", messages.len());

    Ok(ConversationRequest {
        conversation_id,
        messages,
        strict_mode,
        store_id,
        use_files,
        provider,
        api_key,
        model,
    })
}

fn finish(violations: Vec<Violation>) -> ValidationError {
    ValidationError::from_violations(violations).unwrap_or_else(|| ValidationError {
        message: "Invalid request".to_string(),
        violations: Vec::new(),
    })
}

fn parse_messages(raw: Option<&Value>, violations: &mut Vec<Violation>) -> Vec<Message> {
    let items = match raw {
        None | Some(Value::Null) => {
            violations.push(Violation::new("messages", "is required"));
            return Vec::new();
        },
        Some(Value::Array(items)) => items,
        Some(_) => {
            violations.push(Violation::new("messages", "must be an array"));
            return Vec::new();
        },
    };

    if items.is_empty() {
        violations.push(Violation::new("messages", "must contain at least 1 message"));
        return Vec::new();
    }
    if items.len() > MAX_MESSAGES {
        violations.push(Violation::new(
            "messages",
            format!("must contain at most {} messages", MAX_MESSAGES),
        ));
    }

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| parse_message(i, item, violations))
        .collect()
}

fn parse_message(index: usize, item: &Value, violations: &mut Vec<Violation>) -> Option<Message> {
    let path = format!("messages[{}]", index);
    let Some(obj) = item.as_object() else {
        violations.push(Violation::new(path, "must be an object"));
        return None;
    };

    let role = match obj.get("role") {
        Some(Value::String(raw)) => {
            let role = Role::parse(raw);
            if role.is_none() {
                violations.push(Violation::new(
                    format!("{}.role", path),
                    "must be one of: user, assistant",
                ));
            }
            role
        },
        None | Some(Value::Null) => {
            violations.push(Violation::new(format!("{}.role", path), "is required"));
            None
        },
        Some(_) => {
            violations.push(Violation::new(format!("{}.role", path), "must be a string"));
            None
        },
    };

    let content = match obj.get("content") {
        Some(Value::String(text)) => {
            if text.trim().is_empty() {
                violations.push(Violation::new(format!("{}.content", path), "must not be empty"));
                None
            } else if text.chars().count() > MAX_MESSAGE_CHARS {
                violations.push(Violation::new(
                    format!("{}.content", path),
                    format!("must be at most {} characters", MAX_MESSAGE_CHARS),
                ));
                None
            } else {
                Some(text.clone())
            }
        },
        None | Some(Value::Null) => {
            violations.push(Violation::new(format!("{}.content", path), "is required"));
            None
        },
        Some(_) => {
            violations.push(Violation::new(format!("{}.content", path), "must be a string"));
            None
        },
    };

    Some(Message { role: role?, content: content? })
}

fn parse_provider(raw: Option<&Value>, violations: &mut Vec<Violation>) -> Option<ModelProvider> {
    match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => {
            let provider = ModelProvider::parse(name);
            if provider.is_none() {
                violations.push(Violation::new("provider", "must be one of: gemini, openai"));
            }
            provider
        },
        Some(_) => {
            violations.push(Violation::new("provider", "must be a string"));
            None
        },
    }
}

/// Absent, null and blank strings all collapse to `None`.
fn optional_string(
    obj: &Map<String, Value>,
    key: &str,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        },
        Some(_) => {
            violations.push(Violation::new(key, "must be a string"));
            None
        },
    }
}

fn optional_bool(obj: &Map<String, Value>, key: &str, violations: &mut Vec<Violation>) -> bool {
    match obj.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            violations.push(Violation::new(key, "must be a boolean"));
            false
        },
    }
}
