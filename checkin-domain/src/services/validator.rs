// Input format checks and display sanitizing

use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

pub const MAX_CODE_LEN: usize = 64;
pub const MAX_EMAIL_LEN: usize = 254;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

pub fn validate_code(raw: &str) -> Result<String, ValidationError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(ValidationError::EmptyCode);
    }
    if code.chars().count() > MAX_CODE_LEN {
        return Err(ValidationError::CodeTooLong { max: MAX_CODE_LEN });
    }
    if let Some(bad) = code
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')))
    {
        return Err(ValidationError::CodeCharacter(bad));
    }
    Ok(code.to_string())
}

pub fn is_goodie_bag_eligible(code: &str) -> bool {
    code.to_ascii_uppercase().contains("GB")
}

pub fn validate_ip(raw: &str) -> Result<IpAddr, ValidationError> {
    raw.trim()
        .parse::<IpAddr>()
        .map_err(|_| ValidationError::InvalidIp(raw.trim().to_string()))
}

pub fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LEN || !EMAIL_PATTERN.is_match(&email) {
        return Err(ValidationError::InvalidEmail(raw.trim().to_string()));
    }
    Ok(email)
}

pub fn sanitize_text(raw: &str, max_len: usize) -> String {
    let trimmed = raw
        .trim()
        .chars()
        .filter(|ch| !ch.is_control())
        .take(max_len)
        .collect::<String>();
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
