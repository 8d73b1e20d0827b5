use serde::{Deserialize, Serialize};

use crate::types::cid::CidLink;
use crate::types::string::{AtStrError, validated_string};

fn check(mime_type: &str) -> Result<(), AtStrError> {
    match mime_type.split_once('/') {
        Some((kind, sub)) if !kind.is_empty() && !sub.is_empty() => Ok(()),
        _ => Err(AtStrError::regex("mime-type", mime_type)),
    }
}

validated_string!(
    /// MIME type of a blob, `type/subtype`
    MimeType,
    check
);

/// Reference to a blob stored alongside a record
///
/// Serialized in JSON as
/// `{"$type": "blob", "ref": {"$link": "<cid>"}, "mimeType": "...", "size": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "$type", rename = "blob", rename_all = "camelCase")]
pub struct Blob {
    /// CID of the blob's content
    pub r#ref: CidLink,
    /// Declared MIME type
    pub mime_type: MimeType,
    /// Size in bytes
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_json_shape() {
        let json = serde_json::json!({
            "$type": "blob",
            "ref": { "$link": "bafkreibme22gw2h7y2h7tg2fhqotaqjucnbc24deqo72b6mkl2egezxhvy" },
            "mimeType": "image/png",
            "size": 1024
        });
        let blob: Blob = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(blob.mime_type.as_str(), "image/png");
        assert_eq!(blob.size, 1024);
        assert_eq!(serde_json::to_value(&blob).unwrap(), json);
    }

    #[test]
    fn mime_types() {
        assert!(MimeType::new("image/*").is_ok());
        assert!(MimeType::new("image").is_err());
        assert!(MimeType::new("/png").is_err());
    }
}
