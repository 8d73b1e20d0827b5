use bobbin_common::types::{AtUri, Datetime, Did, Handle, Nsid};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct View {
    did: Did,
    handle: Handle,
    uri: AtUri,
    indexed_at: Datetime,
}

#[test]
fn formats_validate_while_deserializing() {
    let view: View = serde_json::from_value(json!({
        "did": "did:plc:abc123",
        "handle": "alice.example.com",
        "uri": "at://did:plc:abc123/com.example.post/3k2a",
        "indexedAt": "2024-05-01T12:00:00.000Z",
    }))
    .unwrap();
    assert_eq!(view.did.method(), "plc");
    assert_eq!(view.uri.authority(), "did:plc:abc123");
    assert_eq!(view.uri.collection(), Some("com.example.post"));
    assert_eq!(view.uri.rkey(), Some("3k2a"));
    assert_eq!(view.indexed_at.as_str(), "2024-05-01T12:00:00.000Z");
    assert_eq!(view.handle.as_str(), "alice.example.com");

    let bad = serde_json::from_value::<View>(json!({
        "did": "plc:abc123",
        "handle": "alice.example.com",
        "uri": "at://did:plc:abc123",
        "indexedAt": "2024-05-01T12:00:00Z",
    }));
    assert!(bad.is_err());
}

#[test]
fn nsid_parts() {
    let nsid: Nsid = "com.example.feed.getTimeline".parse().unwrap();
    assert_eq!(nsid.domain_authority(), "com.example.feed");
    assert_eq!(nsid.name(), "getTimeline");
    assert!(!Nsid::is_valid("com.example"));
    assert!(!Nsid::is_valid("invalid-ref-format"));
}
