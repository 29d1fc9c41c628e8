//! Input validation utilities

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use common::broadcast::QrScan;

/// A single failed field rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// All field failures of one payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub issues: Vec<FieldIssue>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A payload-level failure not tied to one field
    pub fn body(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add("body", message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Body of `POST /qr`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrScanRequest {
    pub student_id: Option<String>,
    pub api_key: Option<String>,
}

/// A scan request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidQrScan {
    pub scan: QrScan,
    pub api_key: Option<String>,
}

/// Validate a QR scan body: `studentId` required and non-empty, `apiKey`
/// optional but non-empty when present
pub fn validate_qr_scan(request: QrScanRequest) -> Result<ValidQrScan, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let student_id = match request.student_id {
        Some(id) if !id.is_empty() => id,
        Some(_) => {
            errors.add("studentId", "String must contain at least 1 character(s)");
            String::new()
        }
        None => {
            errors.add("studentId", "Required");
            String::new()
        }
    };

    if matches!(request.api_key.as_deref(), Some("")) {
        errors.add("apiKey", "String must contain at least 1 character(s)");
    }

    errors.into_result(ValidQrScan {
        scan: QrScan { student_id },
        api_key: request.api_key,
    })
}

/// Normalize a login email: trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password strength for newly created accounts
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_upper {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !has_lower {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !has_digit {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}
