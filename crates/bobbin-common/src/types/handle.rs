use std::sync::LazyLock;

use regex::Regex;

use crate::types::string::{AtStrError, validated_string};

/// Regex for handle validation per AT Protocol spec.
pub static HANDLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$").unwrap()
});

const MAX_LEN: usize = 253;

fn check(handle: &str) -> Result<(), AtStrError> {
    if handle.len() > MAX_LEN {
        Err(AtStrError::too_long("handle", handle, MAX_LEN, handle.len()))
    } else if !HANDLE_REGEX.is_match(handle) {
        Err(AtStrError::regex("handle", handle))
    } else {
        Ok(())
    }
}

validated_string!(
    /// AT Protocol handle, a DNS name such as `alice.bsky.social`
    Handle,
    check
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles() {
        assert!(Handle::new("alice.bsky.social").is_ok());
        assert!(Handle::new("a.co").is_ok());
        assert!(Handle::new("xn--ls8h.test").is_ok());
        assert!(Handle::new("alice").is_err());
        assert!(Handle::new("alice.3com").is_err());
        assert!(Handle::new("-alice.test").is_err());
        assert!(Handle::new("alice..test").is_err());
    }
}
