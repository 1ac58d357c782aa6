/// WhatsApp phone number normalization
///
/// Every phone number stored or rendered by the marketplace goes through
/// [`normalize_whatsapp`], so registration, number updates and owner contact
/// links all agree on one canonical `62…` form.
///
/// # Rules
///
/// 1. Strip every non-digit character (`+`, spaces, dashes, parentheses).
/// 2. The digits must start with `0` or `62`, followed by 9 to 14 digits.
/// 3. A leading `0` is replaced by the `62` country code.
///
/// # Example
///
/// ```
/// use kosan_shared::phone::normalize_whatsapp;
///
/// assert_eq!(normalize_whatsapp("0812-3456-7890").unwrap(), "6281234567890");
/// assert_eq!(normalize_whatsapp("6281234567890").unwrap(), "6281234567890");
/// assert!(normalize_whatsapp("12345").is_err());
/// ```

/// Country code prefix used for Indonesian numbers
pub const COUNTRY_CODE: &str = "62";

/// Minimum number of digits after the `0` / `62` prefix
pub const MIN_SUBSCRIBER_DIGITS: usize = 9;

/// Maximum number of digits after the `0` / `62` prefix
pub const MAX_SUBSCRIBER_DIGITS: usize = 14;

/// Example inputs that pass validation, shown to users on rejection
pub const VALID_EXAMPLES: [&str; 3] = ["628123456789", "08123456789", "62123456789"];

/// Error returned when a phone number cannot be normalized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhoneError {
    /// Input contained no digits at all
    #[error("WhatsApp number is required")]
    Empty,

    /// Digits do not match the `0…` / `62…` form
    #[error("Invalid WhatsApp number format")]
    InvalidFormat,
}

impl PhoneError {
    /// Example valid formats to show alongside the error
    pub fn valid_examples(&self) -> Vec<String> {
        VALID_EXAMPLES.iter().map(|s| s.to_string()).collect()
    }
}

/// Normalizes a free-form phone number into the `62…` form
///
/// # Errors
///
/// - [`PhoneError::Empty`] if the input holds no digits
/// - [`PhoneError::InvalidFormat`] if the digits are not `0`/`62` prefixed
///   or the subscriber part is outside 9..=14 digits
pub fn normalize_whatsapp(input: &str) -> Result<String, PhoneError> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return Err(PhoneError::Empty);
    }

    // "62" is checked first so "620…" keeps its country code
    let subscriber = if let Some(rest) = digits.strip_prefix(COUNTRY_CODE) {
        rest
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest
    } else {
        return Err(PhoneError::InvalidFormat);
    };

    if !(MIN_SUBSCRIBER_DIGITS..=MAX_SUBSCRIBER_DIGITS).contains(&subscriber.len()) {
        return Err(PhoneError::InvalidFormat);
    }

    Ok(format!("{}{}", COUNTRY_CODE, subscriber))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_zero_is_converted() {
        assert_eq!(normalize_whatsapp("081234567890").unwrap(), "6281234567890");
    }

    #[test]
    fn test_country_code_passes_through() {
        assert_eq!(normalize_whatsapp("6281234567890").unwrap(), "6281234567890");
    }

    #[test]
    fn test_short_number_rejected() {
        assert_eq!(normalize_whatsapp("12345"), Err(PhoneError::InvalidFormat));
    }

    #[test]
    fn test_formatting_characters_are_stripped() {
        assert_eq!(
            normalize_whatsapp("+62 812-3456-7890").unwrap(),
            "6281234567890"
        );
        assert_eq!(
            normalize_whatsapp("(0812) 3456 7890").unwrap(),
            "6281234567890"
        );
    }

    #[test]
    fn test_other_prefixes_rejected() {
        // Neither 0- nor 62-prefixed
        assert_eq!(
            normalize_whatsapp("81234567890"),
            Err(PhoneError::InvalidFormat)
        );
        assert_eq!(
            normalize_whatsapp("+1 415 555 0100"),
            Err(PhoneError::InvalidFormat)
        );
    }

    #[test]
    fn test_subscriber_length_bounds() {
        // 9 digits after the prefix is the minimum
        assert_eq!(normalize_whatsapp("0812345678").unwrap(), "62812345678");
        assert!(normalize_whatsapp("081234567").is_err());

        // 14 digits after the prefix is the maximum
        assert_eq!(
            normalize_whatsapp("6281234567890123").unwrap(),
            "6281234567890123"
        );
        assert!(normalize_whatsapp("628123456789012345").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_whatsapp(""), Err(PhoneError::Empty));
        assert_eq!(normalize_whatsapp(" - "), Err(PhoneError::Empty));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize_whatsapp("0812 3456 7890").unwrap();
        let twice = normalize_whatsapp(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_valid_examples_all_normalize() {
        for example in VALID_EXAMPLES {
            assert!(normalize_whatsapp(example).is_ok(), "{} should be valid", example);
        }
        assert_eq!(PhoneError::InvalidFormat.valid_examples().len(), 3);
    }
}
