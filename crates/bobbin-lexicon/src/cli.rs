use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate Rust code from Lexicon schemas")]
pub struct CodegenArgs {
    /// Directory containing Lexicon JSON files
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Output directory for generated Rust code
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Path generated code uses to reach the runtime crate
    #[arg(long, default_value = "::bobbin_common")]
    pub runtime: String,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
