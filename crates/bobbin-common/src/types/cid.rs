use serde::{Deserialize, Serialize};

use crate::types::string::{AtStrError, validated_string};

pub use cid::Cid as IpldCid;

fn check(cid: &str) -> Result<(), AtStrError> {
    IpldCid::try_from(cid)
        .map(|_| ())
        .map_err(|e| AtStrError::parse("cid", cid, e))
}

validated_string!(
    /// Content identifier in its string form (`format: "cid"`)
    Cid,
    check
);

impl Cid {
    /// Decode into the binary CID
    pub fn to_ipld(&self) -> Result<IpldCid, cid::Error> {
        IpldCid::try_from(self.as_str())
    }
}

/// A `cid-link` value, serialized in JSON as `{"$link": "<cid>"}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CidLink {
    /// The linked CID
    #[serde(rename = "$link")]
    pub link: Cid,
}

impl CidLink {
    /// Wrap a CID
    pub fn new(link: Cid) -> Self {
        Self { link }
    }
}
