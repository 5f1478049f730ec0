use crate::errors::InternalError;
use crate::errors::internal::CredentialError;

/// Length and character class rules enforced before every hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 50,
        }
    }
}

impl PasswordPolicy {
    /// Length is counted in characters, not bytes
    pub fn validate(&self, password: &str) -> Result<(), InternalError> {
        let length = password.chars().count();
        if length < self.min_length || length > self.max_length {
            return Err(CredentialError::PasswordValidationFailed(format!(
                "A senha deve ter entre {} e {} caracteres",
                self.min_length, self.max_length
            ))
            .into());
        }

        let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());

        if !(has_upper && has_lower && has_digit) {
            return Err(CredentialError::PasswordValidationFailed(
                "A senha deve conter pelo menos uma letra maiúscula, uma minúscula e um número"
                    .to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: Result<(), InternalError>) -> String {
        match result {
            Err(InternalError::Credential(CredentialError::PasswordValidationFailed(msg))) => msg,
            other => panic!("Expected PasswordValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_accepts_valid_passwords() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("Abcdefg1").is_ok());
        assert!(policy.validate(&format!("Aa1{}", "x".repeat(47))).is_ok());
    }

    #[test]
    fn test_rejects_length_out_of_range() {
        let policy = PasswordPolicy::default();
        assert!(reason(policy.validate("Weak1")).contains("entre 8 e 50"));
        assert!(reason(policy.validate("Abcdef1")).contains("entre 8 e 50"));
        assert!(reason(policy.validate(&format!("Aa1{}", "x".repeat(48)))).contains("entre 8 e 50"));
    }

    #[test]
    fn test_length_counts_characters() {
        // 8 characters, more than 8 bytes
        assert!(PasswordPolicy::default().validate("Aaáááá1x").is_ok());
    }

    #[test]
    fn test_rejects_missing_character_classes() {
        let policy = PasswordPolicy::default();
        for password in ["abcdefg1", "ABCDEFG1", "Abcdefgh"] {
            assert!(reason(policy.validate(password)).contains("maiúscula"), "{}", password);
        }
    }
}
