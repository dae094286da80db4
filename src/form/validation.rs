//! Field normalizers and submit-time validation rules

use serde::Serialize;
use thiserror::Error;

use super::Level;

/// Punctuation accepted by the special-character password rule
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const MOBILE_DIGITS: usize = 10;
pub const AADHAAR_DIGITS: usize = 12;

/// The five independent password predicates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordStrength {
    pub has_uppercase: bool,
    pub has_lowercase: bool,
    pub has_number: bool,
    pub has_special_char: bool,
    pub has_min_length: bool,
}

impl PasswordStrength {
    pub fn evaluate(password: &str) -> Self {
        Self {
            has_uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            has_lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            has_number: password.chars().any(|c| c.is_ascii_digit()),
            has_special_char: password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)),
            // Length counts UTF-16 units, matching browser string length
            has_min_length: password.encode_utf16().count() >= PASSWORD_MIN_LENGTH,
        }
    }

    /// All five predicates hold
    pub fn is_valid(&self) -> bool {
        self.has_uppercase
            && self.has_lowercase
            && self.has_number
            && self.has_special_char
            && self.has_min_length
    }
}

/// Keep only ASCII digits, at most `max` of them
pub fn digits_only(input: &str, max: usize) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).take(max).collect()
}

/// Aadhaar with every non-digit removed (no truncation)
pub fn normalize_aadhaar(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn is_valid_aadhaar(input: &str) -> bool {
    normalize_aadhaar(input).len() == AADHAAR_DIGITS
}

pub fn is_valid_mobile(input: &str) -> bool {
    input.len() == MOBILE_DIGITS && input.chars().all(|c| c.is_ascii_digit())
}

/// First failing submit-time rule
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,

    #[error("Valid email is required")]
    EmailInvalid,

    #[error("Enter a valid password")]
    PasswordInvalid,

    #[error("Valid 10-digit mobile number is required")]
    MobileInvalid,

    #[error("Aadhaar must be exactly 12 digits")]
    AadhaarInvalid,

    #[error("Office address is required")]
    OfficeAddressRequired,

    /// Manual entry chosen but left blank
    #[error("{} name is required", .0.title())]
    LevelNameRequired(Level),

    #[error("Please select a {}", .0.as_str())]
    LevelNotSelected(Level),

    #[error("Gram Panchayat ID is required")]
    GramPanchayatIdRequired,
}

impl ValidationError {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::NameRequired => "VALIDATION_NAME",
            ValidationError::EmailInvalid => "VALIDATION_EMAIL",
            ValidationError::PasswordInvalid => "VALIDATION_PASSWORD",
            ValidationError::MobileInvalid => "VALIDATION_MOBILE",
            ValidationError::AadhaarInvalid => "VALIDATION_AADHAAR",
            ValidationError::OfficeAddressRequired => "VALIDATION_OFFICE_ADDRESS",
            ValidationError::LevelNameRequired(level) | ValidationError::LevelNotSelected(level) => {
                match level {
                    Level::District => "VALIDATION_DISTRICT",
                    Level::Taluk => "VALIDATION_TALUK",
                    Level::Village => "VALIDATION_VILLAGE",
                    Level::Panchayat => "VALIDATION_PANCHAYAT",
                }
            }
            ValidationError::GramPanchayatIdRequired => "VALIDATION_GRAM_PANCHAYAT_ID",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_password_predicate_is_independent() {
        let strong = PasswordStrength::evaluate("Panch@yat9");
        assert!(strong.is_valid());

        let cases = [
            ("panch@yat9", PasswordStrength { has_uppercase: false, ..strong }),
            ("PANCH@YAT9", PasswordStrength { has_lowercase: false, ..strong }),
            ("Panch@yatX", PasswordStrength { has_number: false, ..strong }),
            ("Panchayat9", PasswordStrength { has_special_char: false, ..strong }),
            ("Pa@yat9", PasswordStrength { has_min_length: false, ..strong }),
        ];
        for (password, expected) in cases {
            let got = PasswordStrength::evaluate(password);
            assert_eq!(got, expected, "{}", password);
            assert!(!got.is_valid(), "{}", password);
        }
    }

    #[test]
    fn test_every_special_char_counts() {
        for c in PASSWORD_SPECIAL_CHARS.chars() {
            let password = format!("Abcdefg1{}", c);
            assert!(PasswordStrength::evaluate(&password).is_valid(), "{:?}", c);
        }
        assert!(!PasswordStrength::evaluate("Abcdefg1~").has_special_char);
    }

    #[test]
    fn test_aadhaar_normalization() {
        assert_eq!(normalize_aadhaar("1234-5678-9012"), "123456789012");
        assert!(is_valid_aadhaar("1234-5678-9012"));
        assert!(is_valid_aadhaar("1234 5678 9012"));
        assert!(!is_valid_aadhaar("12345"));
        assert!(!is_valid_aadhaar("1234567890123"));
    }

    #[test]
    fn test_digits_only_strips_and_truncates() {
        assert_eq!(digits_only("98450-12345-678", MOBILE_DIGITS), "9845012345");
        assert_eq!(digits_only("+91 98450", MOBILE_DIGITS), "9198450");
        assert!(is_valid_mobile("9845012345"));
        assert!(!is_valid_mobile("984501234"));
        assert!(!is_valid_mobile("98450a2345"));
    }

    #[test]
    fn test_level_messages() {
        assert_eq!(
            ValidationError::LevelNotSelected(Level::Taluk).to_string(),
            "Please select a taluk"
        );
        assert_eq!(
            ValidationError::LevelNameRequired(Level::Village).to_string(),
            "Village name is required"
        );
        assert_eq!(
            ValidationError::LevelNotSelected(Level::Panchayat).code(),
            "VALIDATION_PANCHAYAT"
        );
    }
}
