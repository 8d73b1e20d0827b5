use core::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::nsid::Nsid;
use crate::types::string::AtStrError;

/// Trait for a collection of records that can be stored in a repository.
///
/// The records all have the same Lexicon schema.
///
/// Implemented by generated code on the record type itself.
pub trait Collection: fmt::Debug + Serialize + DeserializeOwned {
    /// The NSID for the Lexicon that defines the schema of records in this collection.
    const NSID: &'static str;

    /// Record key type declared by the Lexicon (`tid`, `nsid`, `any`, `literal:<value>`)
    const KEY: &'static str;

    /// Returns the [`Nsid`] for this collection, parsed from [`Self::NSID`].
    fn nsid() -> Result<Nsid, AtStrError> {
        Nsid::new_static(Self::NSID)
    }

    /// Returns the repo path `<collection>/<record-key>` for a record.
    fn repo_path(rkey: &str) -> String {
        format!("{}/{}", Self::NSID, rkey)
    }
}
