//! Masking for sensitive values in human-facing output.
//!
//! Detection is name-based: a variable whose name contains one of the
//! usual credential markers is masked wherever sheet values are printed,
//! unless the caller asks for the plain value. Exports are never masked.

/// Name fragments that mark a variable as sensitive.
const SENSITIVE_MARKERS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "key",
    "auth",
    "credential",
    "cert",
    "private",
    "jwt",
    "dsn",
    "database_url",
];

/// True when the variable name looks like it holds a credential.
pub fn is_sensitive(name: &str) -> bool {
    let lower = name.to_lowercase();
    SENSITIVE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Mask a value, keeping its length. Values longer than eight characters
/// keep their first and last two characters.
pub fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let first: String = chars[..2].iter().collect();
        let last: String = chars[chars.len() - 2..].iter().collect();
        format!("{}{}{}", first, "*".repeat(chars.len() - 4), last)
    } else {
        "*".repeat(chars.len())
    }
}

/// The value as it should be displayed: masked when the name is sensitive
/// and `reveal` is false.
pub fn display_value(name: &str, value: &str, reveal: bool) -> String {
    if !reveal && is_sensitive(name) {
        mask_value(value)
    } else {
        value.to_string()
    }
}
