use bobbin_lexicon::cli::CodegenArgs;
use bobbin_lexicon::codegen::{CodeGenerator, GeneratorConfig};
use bobbin_lexicon::corpus::LexiconCorpus;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> miette::Result<()> {
    let args = CodegenArgs::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(input = %args.input.display(), "loading lexicons");
    let corpus = LexiconCorpus::load_from_dir(&args.input)?;
    tracing::info!(documents = corpus.len(), "loaded lexicon documents");

    for unresolved in corpus.unresolved_refs() {
        tracing::warn!(
            lexicon = %unresolved.doc,
            def = %unresolved.def,
            reference = %unresolved.reference,
            "reference does not resolve within the corpus, generating a generic object"
        );
    }

    let codegen = CodeGenerator::new(GeneratorConfig {
        runtime_crate: args.runtime,
    });
    let written = codegen.write_to_disk(&corpus, &args.output)?;

    tracing::info!(
        files = written.len(),
        output = %args.output.display(),
        "generated code"
    );

    Ok(())
}
