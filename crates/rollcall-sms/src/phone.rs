//! Phone number normalization for Philippine mobile numbers.

use rollcall_core::constants::PHONE_COUNTRY_CODE;

/// Normalize a phone number to `+63...`.
///
/// Non-digits are stripped first. Numbers already carrying the country code
/// keep it, the local trunk prefix `0` is replaced, and a bare 10-digit
/// mobile number gets the code prepended. Anything else is prefixed as is.
///
/// ```
/// use rollcall_sms::format_phone_number;
///
/// assert_eq!(format_phone_number("0917-123-4567"), "+639171234567");
/// assert_eq!(format_phone_number("+63 917 123 4567"), "+639171234567");
/// assert_eq!(format_phone_number("9171234567"), "+639171234567");
/// ```
pub fn format_phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();

    if digits.starts_with(PHONE_COUNTRY_CODE) {
        format!("+{digits}")
    } else if let Some(local) = digits.strip_prefix('0')
        && local.starts_with('9')
    {
        format!("+{PHONE_COUNTRY_CODE}{local}")
    } else {
        format!("+{PHONE_COUNTRY_CODE}{digits}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("09171234567", "+639171234567")]
    #[case("0917 123 4567", "+639171234567")]
    #[case("639171234567", "+639171234567")]
    #[case("+63-917-123-4567", "+639171234567")]
    #[case("9171234567", "+639171234567")]
    #[case("(02) 8123 4567", "+630281234567")]
    #[case("12345", "+6312345")]
    #[case("", "+63")]
    fn test_format_phone_number(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_phone_number(input), expected);
    }
}
