use crate::types::string::{AtStrError, validated_string};

fn check(uri: &str) -> Result<(), AtStrError> {
    if uri.is_empty() || uri.chars().any(char::is_whitespace) {
        Err(AtStrError::regex("uri", uri))
    } else {
        Ok(())
    }
}

validated_string!(
    /// Generic URI or URI reference (`format: "uri"` / `"uri-reference"`).
    ///
    /// Validation is lenient: any non-empty string without whitespace is
    /// accepted, so relative references survive untouched.
    Uri,
    check
);

impl Uri {
    /// Parse as an absolute URL
    pub fn to_url(&self) -> Result<url::Url, url::ParseError> {
        url::Url::parse(self.as_str())
    }
}
