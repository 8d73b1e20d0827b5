use std::sync::LazyLock;

use regex::Regex;

use crate::types::string::{AtStrError, validated_string};

/// Regex for `at://` URIs: authority (DID or handle), optional collection
/// NSID, optional record key, optional fragment.
pub static AT_URI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^at://(did:[a-z]+:[a-zA-Z0-9._:%-]*[a-zA-Z0-9._-]|[a-zA-Z0-9][a-zA-Z0-9.-]*)(/[a-zA-Z][a-zA-Z0-9.-]*(/[a-zA-Z0-9._~:@!$&'()*+,;=-]{1,512})?)?(#/[^\s]*)?$").unwrap()
});

const MAX_LEN: usize = 8192;

fn check(uri: &str) -> Result<(), AtStrError> {
    if uri.len() > MAX_LEN {
        Err(AtStrError::too_long("at-uri", uri, MAX_LEN, uri.len()))
    } else if !AT_URI_REGEX.is_match(uri) {
        Err(AtStrError::regex("at-uri", uri))
    } else {
        Ok(())
    }
}

validated_string!(
    /// AT Protocol URI, `at://<authority>[/<collection>[/<rkey>]]`
    AtUri,
    check
);

impl AtUri {
    fn path_segments(&self) -> impl Iterator<Item = &str> {
        let rest = &self[5..];
        let rest = rest.split('#').next().unwrap_or_default();
        rest.split('/')
    }

    /// The DID or handle the URI is rooted at
    pub fn authority(&self) -> &str {
        self.path_segments().next().unwrap_or_default()
    }

    /// Collection NSID, if present
    pub fn collection(&self) -> Option<&str> {
        self.path_segments().nth(1)
    }

    /// Record key, if present
    pub fn rkey(&self) -> Option<&str> {
        self.path_segments().nth(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts() {
        let uri = AtUri::new("at://did:plc:abc/app.bsky.feed.post/3jwdwj2ctlk26").unwrap();
        assert_eq!(uri.authority(), "did:plc:abc");
        assert_eq!(uri.collection(), Some("app.bsky.feed.post"));
        assert_eq!(uri.rkey(), Some("3jwdwj2ctlk26"));

        let bare = AtUri::new("at://alice.test").unwrap();
        assert_eq!(bare.authority(), "alice.test");
        assert_eq!(bare.collection(), None);
    }

    #[test]
    fn rejects_non_at_uris() {
        assert!(AtUri::new("https://example.com").is_err());
        assert!(AtUri::new("at://").is_err());
        assert!(AtUri::new("at://alice.test/app.bsky.feed.post/a b").is_err());
    }
}
