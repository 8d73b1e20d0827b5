use crate::types::string::{AtStrError, validated_string};

fn check(lang: &str) -> Result<(), AtStrError> {
    langtag::LangTag::new(lang)
        .map(|_| ())
        .map_err(|_| AtStrError::parse("language", lang, "not a BCP 47 language tag"))
}

validated_string!(
    /// An IETF language tag (`format: "language"`).
    ///
    /// Uses the langtag crate for validation, stored as a SmolStr.
    Language,
    check
);
