//! Shared UTF-8-safe truncation helpers.
//!
//! Byte slicing can panic when the cut falls inside a multi-byte character,
//! so previews go through these helpers.

/// Maximum characters kept for a session's first-message preview.
pub const SESSION_PREVIEW_CHARS: usize = 50;

/// Truncate by characters and append `suffix` when truncation occurs.
pub fn truncate_with_suffix_by_chars(text: &str, max_chars: usize, suffix: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let prefix: String = text.chars().take(max_chars).collect();
    format!("{prefix}{suffix}")
}

/// Preview stored for a new session, built from its first user message.
pub fn session_preview(first_message: &str) -> String {
    truncate_with_suffix_by_chars(first_message, SESSION_PREVIEW_CHARS, "...")
}

/// Format an integer with `,` thousands separators (`67391582` → `67,391,582`).
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
