//! Phone number normalization for provider contacts.
//!
//! The provider addresses contacts by digits in international form
//! (country calling code followed by the subscriber number, no `+`).
//! Webhook phone strings arrive in whatever format the customer typed;
//! entries that cannot be normalized are skipped by the dispatcher
//! without error.

/// Normalize a raw phone string to international digits.
///
/// Accepted inputs, in order of recognition:
///
/// - `+<country><number>` international form
/// - `00<country><number>` international dialing prefix
/// - `0<number>` local form, prefixed with `default_country`
/// - bare digits already starting with `default_country`
///
/// Separators (spaces, dashes, dots, parentheses) are stripped first.
/// Returns `None` for anything else: letters, too few or too many
/// digits, or an empty string.
#[must_use]
pub fn normalize(raw: &str, default_country: &str) -> Option<String> {
    let trimmed = raw.trim();

    let (has_plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return None,
        }
    }

    let normalized = if has_plus {
        digits
    } else if let Some(after_prefix) = digits.strip_prefix("00") {
        after_prefix.to_string()
    } else if let Some(local) = digits.strip_prefix('0') {
        format!("{default_country}{local}")
    } else if digits.starts_with(default_country) {
        digits
    } else {
        return None;
    };

    // E.164 allows at most 15 digits; anything shorter than 8 cannot be
    // a full international number.
    if normalized.len() < 8 || normalized.len() > 15 {
        return None;
    }

    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_form_gets_default_country() {
        assert_eq!(
            normalize("050-123-4567", "972").as_deref(),
            Some("972501234567")
        );
        assert_eq!(
            normalize("052 987 6543", "972").as_deref(),
            Some("972529876543")
        );
    }

    #[test]
    fn test_international_forms() {
        assert_eq!(
            normalize("+972-50-1234567", "972").as_deref(),
            Some("972501234567")
        );
        assert_eq!(
            normalize("00972501234567", "972").as_deref(),
            Some("972501234567")
        );
        assert_eq!(
            normalize("972501234567", "972").as_deref(),
            Some("972501234567")
        );
    }

    #[test]
    fn test_parenthesized_separators() {
        assert_eq!(
            normalize("(050) 123.4567", "972").as_deref(),
            Some("972501234567")
        );
    }

    #[test]
    fn test_unparseable_inputs_are_skipped() {
        assert_eq!(normalize("", "972"), None);
        assert_eq!(normalize("call me", "972"), None);
        assert_eq!(normalize("050-12ab-4567", "972"), None);
        // Foreign number with no recognizable prefix
        assert_eq!(normalize("15551234567", "972"), None);
    }

    #[test]
    fn test_length_bounds() {
        // Too short once normalized
        assert_eq!(normalize("0512", "972"), None);
        // Longer than E.164 allows
        assert_eq!(normalize("+9725012345678901234", "972"), None);
    }

    #[test]
    fn test_plus_form_keeps_foreign_country() {
        // Explicit international numbers pass through regardless of the
        // default region.
        assert_eq!(
            normalize("+15551234567", "972").as_deref(),
            Some("15551234567")
        );
    }
}
