use std::fmt;

use rand::distr::Alphanumeric;
use rand::Rng;

/// Shared secret between the orchestrator and the target runner it generates.
///
/// Generated once per orchestrator and read-only afterwards. Never printed:
/// both `Debug` and `Display` are redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct IntegrationSecret(String);

impl IntegrationSecret {
    pub const LENGTH: usize = 32;

    pub fn generate() -> Self {
        let value = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(Self::LENGTH)
            .map(char::from)
            .collect();
        Self(value)
    }

    pub fn from_value(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Exact comparison, examining every byte regardless of where the first
    /// difference is.
    pub fn matches(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
    }

    /// Cleartext value, for writing the target runner script only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IntegrationSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IntegrationSecret(<redacted>)")
    }
}

impl fmt::Display for IntegrationSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secrets_are_alphanumeric_and_unique() {
        let a = IntegrationSecret::generate();
        let b = IntegrationSecret::generate();
        assert_eq!(a.expose().len(), IntegrationSecret::LENGTH);
        assert!(a.expose().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn matches_exact_value_only() {
        let secret = IntegrationSecret::from_value("abc123");
        assert!(secret.matches("abc123"));
        assert!(!secret.matches("abc124"));
        assert!(!secret.matches("abc1234"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn formatting_is_redacted() {
        let secret = IntegrationSecret::from_value("topsecret");
        assert!(!format!("{secret:?}").contains("topsecret"));
        assert!(!format!("{secret}").contains("topsecret"));
    }
}
