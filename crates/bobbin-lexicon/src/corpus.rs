use crate::error::{LexiconError, Result};
use crate::lexicon::{LexType, LexiconDoc};
use crate::parser;
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Set of loaded lexicons, keyed by document id
#[derive(Debug, Clone, Default)]
pub struct LexiconCorpus {
    docs: BTreeMap<SmolStr, LexiconDoc>,
}

/// A reference that names a document or definition missing from the corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRef {
    /// Document containing the reference
    pub doc: SmolStr,
    /// Definition containing the reference
    pub def: SmolStr,
    /// The reference as written
    pub reference: String,
}

impl LexiconCorpus {
    /// Create an empty corpus
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file under `path`, in file-name order
    ///
    /// A file that fails to parse fails the whole load; the error names the
    /// file.
    pub fn load_from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref();
        let mut corpus = Self::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                LexiconError::io(path, e.into())
            })?;
            let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
            if !entry.file_type().is_file() || !is_json {
                continue;
            }
            let doc = parser::parse_file(entry.path())?;
            corpus.insert(doc).map_err(|e| e.in_file(entry.path()))?;
        }

        tracing::debug!(dir = %root.display(), count = corpus.len(), "loaded lexicon corpus");
        Ok(corpus)
    }

    /// Add a document; ids must be unique within the corpus
    pub fn insert(&mut self, doc: LexiconDoc) -> Result<()> {
        let id = SmolStr::new(doc.id.as_str());
        if self.docs.contains_key(&id) {
            return Err(LexiconError::structural(
                "id",
                format!("lexicon `{id}` is defined more than once"),
            ));
        }
        self.docs.insert(id, doc);
        Ok(())
    }

    /// Get a lexicon document by NSID
    pub fn get(&self, nsid: &str) -> Option<&LexiconDoc> {
        self.docs.get(nsid)
    }

    /// Resolve a fully qualified reference
    ///
    /// - `com.example.feed.post` → `main` of that document
    /// - `com.example.feed.post#reply` → `reply` of that document
    pub fn resolve_ref(&self, ref_str: &str) -> Option<(&LexiconDoc, &LexType)> {
        let (nsid, def_name) = ref_str.split_once('#').unwrap_or((ref_str, "main"));
        let doc = self.get(nsid)?;
        let def = doc.def(def_name)?;
        Some((doc, def))
    }

    /// Check if a reference exists
    pub fn ref_exists(&self, ref_str: &str) -> bool {
        self.resolve_ref(ref_str).is_some()
    }

    /// Cross-document references that point outside the corpus
    ///
    /// Local references were already checked when each document was parsed.
    pub fn unresolved_refs(&self) -> Vec<UnresolvedRef> {
        let mut missing = Vec::new();
        for doc in self.docs.values() {
            for (def_name, node) in &doc.defs {
                for reference in node.refs() {
                    if doc.local_target(reference).is_some() || self.ref_exists(reference) {
                        continue;
                    }
                    missing.push(UnresolvedRef {
                        doc: SmolStr::new(doc.id.as_str()),
                        def: def_name.clone(),
                        reference: reference.to_string(),
                    });
                }
            }
        }
        missing
    }

    /// Iterate over all documents, ordered by id
    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &LexiconDoc)> {
        self.docs.iter()
    }

    /// Number of loaded lexicons
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Check if corpus is empty
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
