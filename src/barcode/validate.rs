use super::CodeType;
use serde::{Deserialize, Serialize};

pub const EMPTY_VALUE: &str = "Barcode value is empty";
pub const UNSUPPORTED_FORMAT: &str = "Unsupported barcode format";

/// Outcome of structural validation. `error` is set exactly when the value
/// is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Validation {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }
}

enum Shape {
    Digits(usize),
    Chars(usize),
    AtLeast(usize),
}

impl Shape {
    fn matches(&self, value: &str) -> bool {
        match *self {
            Shape::Digits(n) => value.len() == n && value.bytes().all(|b| b.is_ascii_digit()),
            Shape::Chars(n) => value.chars().count() == n,
            Shape::AtLeast(n) => value.chars().count() >= n,
        }
    }
}

fn shape_for(code_type: &CodeType) -> Shape {
    match code_type {
        CodeType::UpcA => Shape::Digits(12),
        CodeType::Ean13 => Shape::Digits(13),
        CodeType::Ean8 => Shape::Digits(8),
        CodeType::Itf14 => Shape::Chars(14),
        _ => Shape::AtLeast(1),
    }
}

fn failure_message(code_type: &CodeType) -> String {
    match code_type {
        CodeType::UpcA => "Invalid UPC-A format (must be 12 digits)".to_string(),
        CodeType::Ean13 => "Invalid EAN-13 format (must be 13 digits)".to_string(),
        CodeType::Ean8 => "Invalid EAN-8 format (must be 8 digits)".to_string(),
        CodeType::Itf14 => "Invalid ITF-14 format (must be 14 characters)".to_string(),
        CodeType::Other(_) => "Invalid barcode format".to_string(),
        known => format!("Invalid {} format", known.label()),
    }
}

/// Checks a normalized `(type, value)` pair against the per-type rules.
/// No checksum verification is done.
pub fn validate(code_type: &CodeType, value: Option<&str>) -> Validation {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => return Validation::invalid(EMPTY_VALUE),
    };

    if *code_type == CodeType::Unknown {
        return Validation::invalid(UNSUPPORTED_FORMAT);
    }

    if shape_for(code_type).matches(value) {
        Validation::valid()
    } else {
        Validation::invalid(failure_message(code_type))
    }
}
