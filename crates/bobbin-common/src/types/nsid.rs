use std::sync::LazyLock;

use regex::Regex;

use crate::types::string::{AtStrError, validated_string};

/// Regex for NSID validation per AT Protocol spec.
///
/// Domain authority segments followed by a name segment; at least three
/// segments in total.
pub static NSID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+(\.[a-zA-Z][a-zA-Z0-9]{0,62})$").unwrap()
});

const MAX_LEN: usize = 317;

fn check(nsid: &str) -> Result<(), AtStrError> {
    if nsid.len() > MAX_LEN {
        Err(AtStrError::too_long("nsid", nsid, MAX_LEN, nsid.len()))
    } else if !NSID_REGEX.is_match(nsid) {
        Err(AtStrError::regex("nsid", nsid))
    } else {
        Ok(())
    }
}

validated_string!(
    /// Namespaced Identifier (NSID)
    ///
    /// Reverse-domain identifier naming a Lexicon document and the XRPC
    /// method it defines, e.g. `com.example.simpleQuery`.
    Nsid,
    check
);

impl Nsid {
    /// Returns the domain authority part of the NSID.
    pub fn domain_authority(&self) -> &str {
        match self.rfind('.') {
            Some(split) => &self[..split],
            None => self.as_str(),
        }
    }

    /// Returns the final name segment of the NSID.
    pub fn name(&self) -> &str {
        match self.rfind('.') {
            Some(split) => &self[split + 1..],
            None => self.as_str(),
        }
    }

    /// Whether a string parses as an NSID
    pub fn is_valid(value: &str) -> bool {
        check(value).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_nsids() {
        assert!(Nsid::new("com.example.foo").is_ok());
        assert!(Nsid::new("com.example.fooBar").is_ok());
        assert!(Nsid::new("net.users.bob.ping").is_ok());
        assert!(Nsid::new("a.b.c").is_ok());
        assert!(Nsid::new("a-0.b-1.c").is_ok());
    }

    #[test]
    fn too_few_segments() {
        assert!(Nsid::new("com.example").is_err());
        assert!(Nsid::new("com").is_err());
        assert!(Nsid::new("invalid-ref-format").is_err());
    }

    #[test]
    fn name_segment_rules() {
        assert!(Nsid::new("com.example.3foo").is_err());
        assert!(Nsid::new("com.example.foo-bar").is_err());
        assert!(Nsid::new("com.example.").is_err());
    }

    #[test]
    fn max_length() {
        let long = format!("com.{}.foo", "a".repeat(320));
        let err = Nsid::new(&long).unwrap_err();
        assert!(matches!(
            err.kind,
            crate::types::string::StrParseKind::TooLong { max: 317, .. }
        ));
    }

    #[test]
    fn parts() {
        let nsid = Nsid::new("com.example.simpleQuery").unwrap();
        assert_eq!(nsid.domain_authority(), "com.example");
        assert_eq!(nsid.name(), "simpleQuery");
    }

    #[test]
    fn deserialize_validates() {
        let ok: Nsid = serde_json::from_str(r#""app.bsky.feed.post""#).unwrap();
        assert_eq!(ok.as_str(), "app.bsky.feed.post");
        assert!(serde_json::from_str::<Nsid>(r#""nope""#).is_err());
    }
}
