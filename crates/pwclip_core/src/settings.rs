//! Validation of a settings document into a [`PasswordRequest`].

use tracing::{debug, trace};

use crate::document::{parse_document, Node};
use crate::types::{
    PasswordRequest, SettingsError, CHARSET_ALPHANUMERIC, DEFAULT_LENGTH, MAX_LENGTH,
};

/// Resolve raw settings bytes into a validated request.
///
/// `question` selects the `qN` answer to fold into the request as its extra
/// field. Unknown keys are ignored. Nothing is returned on any failure.
pub fn resolve_settings(
    bytes: &[u8],
    question: Option<u32>,
) -> Result<PasswordRequest, SettingsError> {
    let root = parse_document(bytes)?;
    resolve_node(&root, question)
}

/// Resolve an already parsed document.
pub fn resolve_node(root: &Node, question: Option<u32>) -> Result<PasswordRequest, SettingsError> {
    let Node::Mapping(entries) = root else {
        return Err(SettingsError::MalformedDocument(
            "unexpected yaml structure".to_string(),
        ));
    };
    trace!(keys = entries.len(), "resolving settings mapping");

    let url = string_field(root, "url")?.unwrap_or_default();
    let username = string_field(root, "username")?.unwrap_or_default();
    let prefix = string_field(root, "prefix")?.unwrap_or_default();

    let charset = match string_field(root, "charset")? {
        Some(charset) if charset.chars().nth(1).is_some() => charset,
        Some(_) => return Err(SettingsError::mismatch("charset")),
        None => CHARSET_ALPHANUMERIC.to_string(),
    };

    let length = match root.get("length") {
        Some(node) => parse_length(node)?,
        None => DEFAULT_LENGTH,
    };

    let extra = match question {
        Some(index) => Some(question_answer(root, index)?),
        None => None,
    };

    debug!(
        length,
        has_prefix = !prefix.is_empty(),
        has_question = extra.is_some(),
        "settings resolved"
    );

    Ok(PasswordRequest {
        url,
        username,
        prefix,
        charset,
        length,
        extra,
    })
}

fn string_field(root: &Node, field: &str) -> Result<Option<String>, SettingsError> {
    match root.get(field) {
        None => Ok(None),
        Some(Node::Scalar(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SettingsError::mismatch(field)),
    }
}

fn parse_length(node: &Node) -> Result<usize, SettingsError> {
    let text = node
        .as_scalar()
        .ok_or_else(|| SettingsError::mismatch("length"))?;

    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SettingsError::mismatch("length"));
    }

    match text.parse::<usize>() {
        Ok(length) if (1..=MAX_LENGTH).contains(&length) => Ok(length),
        _ => Err(SettingsError::mismatch("length")),
    }
}

fn question_answer(root: &Node, index: u32) -> Result<String, SettingsError> {
    let key = format!("q{}", index);
    match root.get(&key) {
        None => Err(SettingsError::QuestionNotFound { index }),
        Some(Node::Scalar(answer)) => Ok(answer.clone()),
        Some(_) => Err(SettingsError::mismatch(key)),
    }
}
