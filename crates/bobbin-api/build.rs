use bobbin_lexicon::codegen::CodeGenerator;
use bobbin_lexicon::corpus::LexiconCorpus;
use miette::{IntoDiagnostic, WrapErr};
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() -> miette::Result<()> {
    println!("cargo::rerun-if-changed=lexicons");

    let corpus = LexiconCorpus::load_from_dir("lexicons")?;
    for unresolved in corpus.unresolved_refs() {
        println!(
            "cargo::warning={}#{}: {} is not in the corpus, generating a generic object",
            unresolved.doc, unresolved.def, unresolved.reference
        );
    }

    let code = CodeGenerator::default().render_inline(&corpus)?;

    let out_dir = PathBuf::from(env::var("OUT_DIR").into_diagnostic()?);
    let target = out_dir.join("generated.rs");
    fs::write(&target, code)
        .into_diagnostic()
        .wrap_err_with(|| format!("writing {}", target.display()))?;

    Ok(())
}
