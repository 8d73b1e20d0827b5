pub mod aturi;
pub mod blob;
pub mod cid;
pub mod collection;
pub mod datetime;
pub mod did;
pub mod handle;
pub mod language;
pub mod nsid;
pub mod string;
pub mod uri;
pub mod value;

pub use aturi::AtUri;
pub use blob::{Blob, MimeType};
pub use cid::{Cid, CidLink};
pub use collection::Collection;
pub use datetime::Datetime;
pub use did::Did;
pub use handle::Handle;
pub use language::Language;
pub use nsid::Nsid;
pub use string::AtStrError;
pub use uri::Uri;
pub use value::{AnyObject, Data};
