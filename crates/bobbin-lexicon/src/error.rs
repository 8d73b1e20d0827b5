use miette::{Diagnostic, SourceSpan};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Broad class of a [`LexiconError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input is not well-formed JSON
    Syntax,
    /// Well-formed JSON that violates the Lexicon meta-schema
    Structural,
    /// Malformed or unresolvable reference
    Reference,
    /// A valid document the generator cannot express
    Generation,
    /// Filesystem failure
    Io,
}

/// Errors from parsing, validating and generating code for lexicons
#[derive(Debug, Error, Diagnostic)]
pub enum LexiconError {
    /// Input is not well-formed JSON
    #[error("invalid JSON at line {line}, column {column}: {message}")]
    #[diagnostic(
        code(lexicon::syntax),
        help("check for unbalanced braces, trailing commas and unterminated strings")
    )]
    Syntax {
        message: String,
        line: usize,
        column: usize,
        /// Source text that failed to parse
        #[source_code]
        src: String,
        /// Location of the error in the source
        #[label("here")]
        span: SourceSpan,
    },

    /// Well-formed JSON that violates the Lexicon meta-schema
    #[error("invalid lexicon at {location}: {message}")]
    #[diagnostic(code(lexicon::structural))]
    Structural { location: String, message: String },

    /// Malformed or unresolvable reference
    #[error("invalid reference {reference:?} at {location}: {message}")]
    #[diagnostic(
        code(lexicon::reference),
        help("references look like `#name`, `nsid` or `nsid#name`")
    )]
    Reference {
        location: String,
        reference: String,
        message: String,
    },

    /// Construct the generator backend cannot express
    #[error("cannot generate code for {location}: {message}")]
    #[diagnostic(code(lexicon::generation))]
    Unsupported { location: String, message: String },

    /// Two documents would be generated into one Rust module
    #[error("name collision: {name} is generated more than once ({module})")]
    #[diagnostic(
        code(lexicon::name_collision),
        help("document ids that differ only in case or separators map to the same module")
    )]
    NameCollision { name: String, module: String },

    /// Generated tokens did not form a valid Rust file
    #[error("failed to format generated code for {module}")]
    #[diagnostic(code(lexicon::format_error))]
    Format {
        module: String,
        #[source]
        source: syn::Error,
    },

    /// IO error when reading lexicons or writing output
    #[error("IO error on {}: {source}", path.display())]
    #[diagnostic(code(lexicon::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Error attributed to one lexicon file
    #[error("in {}: {source}", path.display())]
    #[diagnostic(forward(source))]
    InFile {
        path: PathBuf,
        source: Box<LexiconError>,
    },
}

impl LexiconError {
    /// Create a syntax error, pointing the span at `line`/`column` of `src`
    pub fn syntax(message: impl Into<String>, line: usize, column: usize, src: &str) -> Self {
        let offset = byte_offset(src, line, column);
        let len = usize::from(offset < src.len());
        Self::Syntax {
            message: message.into(),
            line,
            column,
            src: src.to_string(),
            span: (offset, len).into(),
        }
    }

    pub fn structural(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Structural {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn reference(
        location: impl Into<String>,
        reference: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Reference {
            location: location.into(),
            reference: reference.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unsupported {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn name_collision(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self::NameCollision {
            name: name.into(),
            module: module.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the file this error came from
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Self::InFile {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Which class of failure this is
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Structural { .. } => ErrorKind::Structural,
            Self::Reference { .. } => ErrorKind::Reference,
            Self::Unsupported { .. } | Self::NameCollision { .. } | Self::Format { .. } => {
                ErrorKind::Generation
            }
            Self::Io { .. } => ErrorKind::Io,
            Self::InFile { source, .. } => source.kind(),
        }
    }
}

/// Byte offset of a 1-based line/column position, clamped to the text
fn byte_offset(src: &str, line: usize, column: usize) -> usize {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(src.len())
}

/// Result type for lexicon operations
pub type Result<T> = std::result::Result<T, LexiconError>;
