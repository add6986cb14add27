/// country calling code prepended to bare ten-digit mobile numbers
pub const INDIA_COUNTRY_CODE: &str = "91";

/// Normalise an Indian mobile number to E.164 (`+91XXXXXXXXXX`).
///
/// Whitespace is removed first. Input already starting with `+` or a trunk `0`
/// is returned as-is; exactly ten digits gain the `+91` prefix; anything else
/// is returned unchanged so callers can decide whether to reject it.
pub fn normalize_indian_mobile_to_e164(contact: &str) -> String {
    let compact: String = contact.chars().filter(|c| !c.is_whitespace()).collect();

    if compact.starts_with('+') || compact.starts_with('0') {
        return compact;
    }

    if is_ten_digits(&compact) {
        return format!("+{}{}", INDIA_COUNTRY_CODE, compact);
    }

    compact
}

/// true when normalisation produces a full `+91` ten-digit mobile
pub fn is_normalized_indian_mobile(contact: &str) -> bool {
    normalize_indian_mobile_to_e164(contact)
        .strip_prefix("+91")
        .map(is_ten_digits)
        .unwrap_or(false)
}

/// Digits-only identifier for the WhatsApp click-to-chat channel, e.g. `919876543210`.
///
/// Returns `None` when fewer than ten digits survive normalisation.
pub fn to_whatsapp_number(contact: &str) -> Option<String> {
    let digits: String = normalize_indian_mobile_to_e164(contact)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    match digits.len() {
        n if n < 10 => None,
        10 => Some(format!("{}{}", INDIA_COUNTRY_CODE, digits)),
        _ => Some(digits),
    }
}

fn is_ten_digits(s: &str) -> bool {
    s.len() == 10 && s.bytes().all(|b| b.is_ascii_digit())
}
