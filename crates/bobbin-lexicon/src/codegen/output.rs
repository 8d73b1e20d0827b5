//! Arranging generated modules into files
//!
//! Each document becomes one module whose path follows its NSID
//! (see [`module_path`]). A corpus is rendered either as a single string of
//! nested `pub mod` blocks, suitable for `include!` from a build script, or
//! as a directory tree rooted at `lib.rs`.

use super::names::module_path;
use super::render::{Renderer, format_file};
use super::utils::make_ident;
use super::CodeGenerator;
use crate::corpus::LexiconCorpus;
use crate::error::{LexiconError, Result};
use crate::lexicon::LexiconDoc;
use proc_macro2::TokenStream;
use quote::quote;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// First line of every generated file
pub const HEADER: &str = "// @generated by bobbin-codegen from Lexicon schemas. Do not edit.\n";

#[derive(Default)]
struct ModuleNode {
    /// NSID of the document rendered at this node
    nsid: Option<String>,
    content: Option<TokenStream>,
    children: BTreeMap<String, ModuleNode>,
}

impl ModuleNode {
    fn insert(&mut self, path: &[String], nsid: &str, content: TokenStream) -> Result<()> {
        let node = path
            .iter()
            .fold(self, |node, segment| node.children.entry(segment.clone()).or_default());
        if let Some(existing) = &node.nsid {
            return Err(LexiconError::name_collision(
                format!("module {}", path.join("::")),
                format!("{existing} and {nsid}"),
            ));
        }
        node.nsid = Some(nsid.to_string());
        node.content = Some(content);
        Ok(())
    }

    /// Content followed by inline child modules
    fn inline_tokens(&self) -> TokenStream {
        let content = &self.content;
        let children = self.children.iter().map(|(name, child)| {
            let ident = make_ident(name);
            let body = child.inline_tokens();
            quote! {
                pub mod #ident {
                    #body
                }
            }
        });
        quote! {
            #content
            #(#children)*
        }
    }

    /// Content followed by declarations of child module files
    fn file_tokens(&self) -> TokenStream {
        let content = &self.content;
        let children = self.children.keys().map(|name| {
            let ident = make_ident(name);
            quote!(pub mod #ident;)
        });
        quote! {
            #content
            #(#children)*
        }
    }

    fn write(&self, base: &Path, path: &mut Vec<String>, written: &mut Vec<PathBuf>) -> Result<()> {
        let file = match path.split_last() {
            None => base.join("lib.rs"),
            Some((last, parents)) => {
                let mut file = parents.iter().fold(base.to_path_buf(), |p, s| p.join(s));
                file.push(format!("{last}.rs"));
                file
            }
        };
        let label = self
            .nsid
            .clone()
            .unwrap_or_else(|| file.display().to_string());
        let text = with_header(format_file(self.file_tokens(), &label)?);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(|e| LexiconError::io(parent, e))?;
        }
        fs::write(&file, text).map_err(|e| LexiconError::io(&file, e))?;
        tracing::debug!(path = %file.display(), "wrote module");
        written.push(file);

        for (name, child) in &self.children {
            path.push(name.clone());
            child.write(base, path, written)?;
            path.pop();
        }
        Ok(())
    }
}

/// Module name as it appears on disk, matching what [`make_ident`] emits
fn file_segment(segment: &str) -> String {
    make_ident(segment)
        .to_string()
        .trim_start_matches("r#")
        .to_string()
}

fn with_header(body: String) -> String {
    format!("{HEADER}\n{body}")
}

impl CodeGenerator {
    fn module_tokens(&self, renderer: &Renderer, doc: &LexiconDoc) -> Result<TokenStream> {
        let module = self.build_module(doc)?;
        Ok(renderer.module(&module))
    }

    fn module_tree(&self, corpus: &LexiconCorpus) -> Result<ModuleNode> {
        let renderer = Renderer::new(self.config())?;
        let mut root = ModuleNode::default();
        for (nsid, doc) in corpus.iter() {
            let tokens = self.module_tokens(&renderer, doc)?;
            let path: Vec<String> = module_path(nsid).iter().map(|s| file_segment(s)).collect();
            root.insert(&path, nsid, tokens)?;
        }
        Ok(root)
    }

    /// Render one document as a standalone, formatted module file
    pub fn render_module(&self, doc: &LexiconDoc) -> Result<String> {
        let renderer = Renderer::new(self.config())?;
        let tokens = self.module_tokens(&renderer, doc)?;
        Ok(with_header(format_file(tokens, doc.id.as_str())?))
    }

    /// Render a whole corpus as nested inline modules in one file
    pub fn render_inline(&self, corpus: &LexiconCorpus) -> Result<String> {
        let root = self.module_tree(corpus)?;
        let text = format_file(root.inline_tokens(), "lexicon corpus")?;
        tracing::debug!(documents = corpus.len(), "rendered corpus");
        Ok(with_header(text))
    }

    /// Write a corpus as a module tree under `dir`, returning the files written
    ///
    /// `dir/lib.rs` declares the top-level modules, and every module with
    /// children declares them as `pub mod name;` next to its own content.
    pub fn write_to_disk(&self, corpus: &LexiconCorpus, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let root = self.module_tree(corpus)?;
        let mut written = Vec::new();
        root.write(dir.as_ref(), &mut Vec::new(), &mut written)?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GeneratorConfig;
    use crate::error::ErrorKind;
    use crate::parser::parse_str;

    fn doc(id: &str) -> LexiconDoc {
        parse_str(&format!(
            r#"{{"lexicon": 1, "id": "{id}", "defs": {{"main": {{"type": "token"}}}}}}"#
        ))
        .unwrap()
    }

    #[test]
    fn inline_modules_nest_by_nsid() {
        let mut corpus = LexiconCorpus::new();
        corpus.insert(doc("com.example.feed.like")).unwrap();
        corpus.insert(doc("com.example.feed.post")).unwrap();
        corpus.insert(doc("com.example.actor")).unwrap();

        let text = CodeGenerator::default().render_inline(&corpus).unwrap();
        assert!(text.starts_with(HEADER));
        assert_eq!(text.matches("pub mod com_example").count(), 1);
        assert_eq!(text.matches("pub mod feed").count(), 1);
        assert!(text.contains("pub const ACTOR: &str = \"com.example.actor\";"));
        let like = text.find("pub mod like").unwrap();
        let post = text.find("pub mod post").unwrap();
        assert!(like < post);
    }

    #[test]
    fn colliding_module_paths_are_errors() {
        let mut corpus = LexiconCorpus::new();
        corpus.insert(doc("com.example.getThing")).unwrap();
        corpus.insert(doc("com.example.GetThing")).unwrap();
        let err = CodeGenerator::default().render_inline(&corpus).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generation);
    }

    #[test]
    fn runtime_path_is_configurable() {
        let doc = parse_str(
            r#"{"lexicon": 1, "id": "com.example.stamp", "defs": {
                "main": {"type": "object", "properties": {"at": {"type": "string", "format": "datetime"}}}
            }}"#,
        )
        .unwrap();
        let generator = CodeGenerator::new(GeneratorConfig {
            runtime_crate: "crate::rt".into(),
        });
        let text = generator.render_module(&doc).unwrap();
        assert!(text.contains("crate::rt::types::Datetime"));

        let broken = CodeGenerator::new(GeneratorConfig {
            runtime_crate: "not a path".into(),
        });
        assert_eq!(
            broken.render_module(&doc).unwrap_err().kind(),
            ErrorKind::Generation
        );
    }

    #[test]
    fn files_follow_module_paths() {
        let mut corpus = LexiconCorpus::new();
        corpus.insert(doc("com.example.feed.post")).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let written = CodeGenerator::default()
            .write_to_disk(&corpus, dir.path())
            .unwrap();

        let expected: Vec<PathBuf> = ["lib.rs", "com_example.rs", "com_example/feed.rs", "com_example/feed/post.rs"]
            .iter()
            .map(|p| dir.path().join(p))
            .collect();
        assert_eq!(written, expected);
        let lib = fs::read_to_string(dir.path().join("lib.rs")).unwrap();
        assert!(lib.contains("pub mod com_example;"));
        let feed = fs::read_to_string(dir.path().join("com_example/feed.rs")).unwrap();
        assert!(feed.contains("pub mod post;"));
        let post = fs::read_to_string(dir.path().join("com_example/feed/post.rs")).unwrap();
        assert!(post.starts_with(HEADER));
        assert!(post.contains("pub const POST"));
    }
}
