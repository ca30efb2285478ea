//! Phone number normalization.

/// Normalize a phone number to E.164, prepending `country_prefix` when the
/// number carries no `+`.
///
/// A single trunk `0` is dropped before the prefix is applied, so
/// `09876543210` and `9876543210` normalize the same way.
pub fn normalize_phone(number: &str, country_prefix: &str) -> Result<String, String> {
    let trimmed = number.trim();
    let has_plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return Err("Phone number must contain at least one digit".into());
    }

    let e164 = if has_plus {
        format!("+{}", digits)
    } else {
        let national = digits.strip_prefix('0').unwrap_or(&digits);
        let prefix = country_prefix.trim_start_matches('+');
        format!("+{}{}", prefix, national)
    };

    let len = e164.len() - 1;
    if len < 7 {
        return Err("Phone number too short".into());
    }
    if len > 15 {
        return Err("Phone number too long".into());
    }

    Ok(e164)
}

/// Strip the leading `+` for vendors that want bare digits.
pub fn digits_only(e164: &str) -> &str {
    e164.trim_start_matches('+')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_applied() {
        assert_eq!(
            normalize_phone("9876543210", "+91"),
            Ok("+919876543210".into())
        );
        assert_eq!(
            normalize_phone("098765 43210", "+91"),
            Ok("+919876543210".into())
        );
        assert_eq!(
            normalize_phone("9876543210", "91"),
            Ok("+919876543210".into())
        );
    }

    #[test]
    fn test_explicit_country_code_kept() {
        assert_eq!(
            normalize_phone("+1 (415) 555-1234", "+91"),
            Ok("+14155551234".into())
        );
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert!(normalize_phone("", "+91").is_err());
        assert!(normalize_phone("abc", "+91").is_err());
        assert!(normalize_phone("+123", "+91").is_err());
        assert!(normalize_phone("+1234567890123456", "+91").is_err());
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("+919876543210"), "919876543210");
        assert_eq!(digits_only("919876543210"), "919876543210");
    }
}
