use smol_str::SmolStr;

pub use crate::types::{
    aturi::AtUri, cid::Cid, datetime::Datetime, did::Did, handle::Handle, language::Language,
    nsid::Nsid, uri::Uri,
};

/// Error when a string fails validation against its Lexicon format
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("invalid {spec}: {kind}")]
#[diagnostic(code(bobbin::string_format))]
pub struct AtStrError {
    /// The string format that was being parsed (`did`, `nsid`, ...)
    pub spec: SmolStr,
    /// The rejected input
    pub input: String,
    /// What was wrong with it
    pub kind: StrParseKind,
}

/// Reason a string failed format validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrParseKind {
    /// Longer than the format allows
    #[error("length {actual} exceeds maximum of {max}")]
    TooLong {
        /// Maximum length
        max: usize,
        /// Length of the input
        actual: usize,
    },
    /// Did not match the format grammar
    #[error("does not match the {0} grammar")]
    Grammar(SmolStr),
    /// Rejected by the parser backing the format
    #[error("{0}")]
    Parse(SmolStr),
}

impl AtStrError {
    /// Input longer than the maximum length
    pub fn too_long(spec: &'static str, input: &str, max: usize, actual: usize) -> Self {
        Self {
            spec: SmolStr::new_static(spec),
            input: input.to_string(),
            kind: StrParseKind::TooLong { max, actual },
        }
    }

    /// Input did not match the grammar regex
    pub fn regex(spec: &'static str, input: &str) -> Self {
        Self {
            spec: SmolStr::new_static(spec),
            input: input.to_string(),
            kind: StrParseKind::Grammar(SmolStr::new_static(spec)),
        }
    }

    /// Input rejected by a backing parser
    pub fn parse(spec: &'static str, input: &str, message: impl std::fmt::Display) -> Self {
        Self {
            spec: SmolStr::new_static(spec),
            input: input.to_string(),
            kind: StrParseKind::Parse(smol_str::format_smolstr!("{message}")),
        }
    }
}

/// Declare a validated, owned string newtype.
///
/// The type stores a [`SmolStr`], validates through the given checker on
/// every construction path (including deserialization), and derefs to `str`.
macro_rules! validated_string {
    ($(#[$meta:meta])* $name:ident, $check:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(smol_str::SmolStr);

        impl $name {
            /// Fallible constructor, validates
            pub fn new(value: impl AsRef<str>) -> Result<Self, $crate::types::string::AtStrError> {
                let value = value.as_ref();
                $check(value)?;
                Ok(Self(smol_str::SmolStr::new(value)))
            }

            /// Fallible constructor for static strings, doesn't allocate
            pub fn new_static(
                value: &'static str,
            ) -> Result<Self, $crate::types::string::AtStrError> {
                $check(value)?;
                Ok(Self(smol_str::SmolStr::new_static(value)))
            }

            /// Borrow the underlying string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::types::string::AtStrError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = <std::borrow::Cow<'de, str> as serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                Self::new(value.as_ref()).map_err(serde::de::Error::custom)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0.as_str())
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for smol_str::SmolStr {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }

        impl TryFrom<&str> for $name {
            type Error = $crate::types::string::AtStrError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::types::string::AtStrError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

pub(crate) use validated_string;
