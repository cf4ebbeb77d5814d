//! Phone number normalization.

const MIN_DIGITS: usize = 8;
const MAX_DIGITS: usize = 15;

/// Normalize a user-supplied phone number into its storage key.
///
/// Spaces and dashes are stripped. What remains must be an optional leading
/// `+` followed by 8 to 15 ASCII digits. Returns `None` otherwise.
///
/// ```
/// use bazaar_domain::phone::normalize_phone;
///
/// assert_eq!(normalize_phone("98765 43210").as_deref(), Some("9876543210"));
/// assert_eq!(normalize_phone("+91-98765-43210").as_deref(), Some("+919876543210"));
/// assert_eq!(normalize_phone("12ab"), None);
/// ```
pub fn normalize_phone(raw: &str) -> Option<String> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    if digits.len() < MIN_DIGITS || digits.len() > MAX_DIGITS {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(compact)
}
