//! Masking of identifier values before they reach logs or alert messages.
//!
//! The engine monitors exactly the data that must never leak through its own
//! observability. Raw values stay inside the store; everything user-facing or
//! logged goes through `mask_value`.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^@\s]+)@([^@\s]+)\.([^@\s.]+)$").unwrap());

static SSN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{3}-?\d{2}-?\d{4}$").unwrap());

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s().-]{7,20}$").unwrap());

const SSN_MASK: &str = "***-**-****";

/// Mask a single identifier value, keeping just enough shape to be
/// recognizable to its owner.
pub fn mask_value(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    if SSN_RE.is_match(value) {
        return SSN_MASK.to_string();
    }
    if let Some(caps) = EMAIL_RE.captures(value) {
        let local = &caps[1];
        let domain = &caps[2];
        let tld = &caps[3];
        return format!(
            "{}***@{}***.{}",
            first_char(local),
            first_char(domain),
            tld
        );
    }
    if PHONE_RE.is_match(value) {
        let digits: Vec<char> = value.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() >= 4 {
            let tail: String = digits[digits.len() - 2..].iter().collect();
            return format!("{}{}", "*".repeat(digits.len() - 2), tail);
        }
    }
    format!("{}***", first_char(value))
}

/// "type value" rendering for log fields and alert text.
pub fn mask_labeled(id_type: &str, value: &str) -> String {
    format!("{} {}", id_type, mask_value(value))
}

fn first_char(s: &str) -> String {
    s.chars().next().map(|c| c.to_string()).unwrap_or_default()
}
