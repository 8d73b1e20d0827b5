use std::sync::LazyLock;

use regex::Regex;

use crate::types::string::{AtStrError, validated_string};

/// Regex for DID validation per AT Protocol spec.
pub static DID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^did:[a-z]+:[a-zA-Z0-9._:%-]*[a-zA-Z0-9._-]$").unwrap());

const MAX_LEN: usize = 2048;

fn check(did: &str) -> Result<(), AtStrError> {
    if did.len() > MAX_LEN {
        Err(AtStrError::too_long("did", did, MAX_LEN, did.len()))
    } else if !DID_REGEX.is_match(did) {
        Err(AtStrError::regex("did", did))
    } else {
        Ok(())
    }
}

validated_string!(
    /// Decentralized Identifier, e.g. `did:plc:abc123`
    Did,
    check
);

impl Did {
    /// The DID method (`plc`, `web`, ...)
    pub fn method(&self) -> &str {
        self.split(':').nth(1).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_dids() {
        assert!(Did::new("did:plc:abc123").is_ok());
        assert!(Did::new("did:web:example.com").is_ok());
        assert!(Did::new("did:plc:foo:bar").is_ok());
        assert!(Did::new("did:method:foo%20bar").is_ok());
    }

    #[test]
    fn invalid_dids() {
        assert!(Did::new("did:").is_err());
        assert!(Did::new("did:plc:").is_err());
        assert!(Did::new("DID:plc:abc").is_err());
        assert!(Did::new("did:PLC:abc").is_err());
        assert!(Did::new("plc:abc").is_err());
    }

    #[test]
    fn max_length() {
        let prefix = "did:plc:";
        let valid = format!("{prefix}{}", "a".repeat(2048 - prefix.len()));
        assert!(Did::new(&valid).is_ok());
        let too_long = format!("{prefix}{}", "a".repeat(2049 - prefix.len()));
        assert!(Did::new(&too_long).is_err());
    }

    #[test]
    fn rejections_carry_the_input() {
        let err = Did::new("plc:abc").unwrap_err();
        assert_eq!(err.spec, "did");
        assert_eq!(err.input, "plc:abc");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn method() {
        assert_eq!(Did::new("did:web:example.com").unwrap().method(), "web");
    }
}
