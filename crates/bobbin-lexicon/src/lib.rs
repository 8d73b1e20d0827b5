//! # Lexicon schema parsing, validation and Rust code generation
//!
//! Lexicon documents are JSON schemas describing AT Protocol records and
//! XRPC methods. This crate parses them into a typed model, checks the
//! meta-schema rules, and generates Rust types plus one client per document
//! that calls methods through [`bobbin_common::XrpcTransport`].
//!
//! ## Usage
//!
//! The `bobbin-codegen` binary turns a directory of lexicons into a module
//! tree:
//!
//! ```bash
//! cargo run -p bobbin-lexicon --bin bobbin-codegen -- \
//!     -i ./lexicons \
//!     -o ./src/generated
//! ```
//!
//! Build scripts can render a corpus into a single file instead:
//!
//! ```no_run
//! use bobbin_lexicon::codegen::CodeGenerator;
//! use bobbin_lexicon::corpus::LexiconCorpus;
//!
//! # fn main() -> bobbin_lexicon::error::Result<()> {
//! let corpus = LexiconCorpus::load_from_dir("lexicons")?;
//! let code = CodeGenerator::default().render_inline(&corpus)?;
//! println!("{} bytes of generated code", code.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`lexicon`] - the document model
//! - [`parser`] - JSON text to [`lexicon::LexiconDoc`]
//! - [`validate`] - meta-schema rules applied while parsing
//! - [`corpus`] - sets of documents loaded from disk
//! - [`codegen`] - Rust code generation from parsed schemas
//! - [`error`] - error kinds shared by every stage

pub mod cli;
pub mod codegen;
pub mod corpus;
pub mod error;
pub mod lexicon;
pub mod parser;
pub mod validate;

pub use codegen::{CodeGenerator, GeneratorConfig};
pub use corpus::LexiconCorpus;
pub use error::{ErrorKind, LexiconError};
pub use lexicon::LexiconDoc;
pub use parser::{parse, parse_file, parse_str};
