//! Per-document store discovery.
//!
//! Each document `<doc>` owns `<vector_root>/<doc>_vectors/` and an optional
//! `<metadata_root>/<doc>_metadata.json`.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use taxrag_core::config::{resolve_with_base, StorageSettings};
use taxrag_core::error::{Error, Result};
use taxrag_core::types::DocumentLocation;

const VECTORS_SUFFIX: &str = "_vectors";
const METADATA_SUFFIX: &str = "_metadata.json";

#[derive(Debug, Clone)]
pub struct Catalog {
    vector_root: PathBuf,
    metadata_root: PathBuf,
}

impl Catalog {
    pub fn new(vector_root: impl Into<PathBuf>, metadata_root: impl Into<PathBuf>) -> Self {
        Self { vector_root: vector_root.into(), metadata_root: metadata_root.into() }
    }

    /// Relative storage paths resolve against `base`.
    pub fn from_settings(base: &Path, storage: &StorageSettings) -> Self {
        Self::new(resolve_with_base(base, &storage.vector_dir), resolve_with_base(base, &storage.metadata_dir))
    }

    pub fn vector_root(&self) -> &Path {
        &self.vector_root
    }

    pub fn location(&self, document_id: &str) -> DocumentLocation {
        DocumentLocation {
            document_id: document_id.to_string(),
            vector_dir: self.vector_root.join(format!("{document_id}{VECTORS_SUFFIX}")),
            metadata_file: self.metadata_root.join(format!("{document_id}{METADATA_SUFFIX}")),
        }
    }

    fn entries(&self) -> Result<Vec<(String, SystemTime)>> {
        let read = match std::fs::read_dir(&self.vector_root) {
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Storage(format!("{}: {e}", self.vector_root.display()))),
        };
        let mut out = Vec::new();
        for entry in read {
            let entry = entry.map_err(|e| Error::Storage(e.to_string()))?;
            let Ok(meta) = entry.metadata() else { continue };
            if !meta.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(doc) = name.strip_suffix(VECTORS_SUFFIX).filter(|d| !d.is_empty()) {
                out.push((doc.to_string(), meta.modified().unwrap_or(SystemTime::UNIX_EPOCH)));
            }
        }
        Ok(out)
    }

    /// Document ids with a vector store, sorted by name.
    pub fn documents(&self) -> Result<Vec<String>> {
        let mut docs: Vec<String> = self.entries()?.into_iter().map(|(d, _)| d).collect();
        docs.sort();
        Ok(docs)
    }

    /// The requested document when its store exists, otherwise the most
    /// recently modified store. `NoIndex` when there is none.
    pub fn resolve(&self, requested: &str) -> Result<DocumentLocation> {
        let wanted = self.location(requested);
        if wanted.vector_dir.is_dir() {
            return Ok(wanted);
        }
        let newest = self
            .entries()?
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)));
        match newest {
            Some((doc, _)) => {
                tracing::warn!(requested, fallback = %doc, "requested document store missing, using most recent");
                Ok(self.location(&doc))
            }
            None => Err(Error::NoIndex(self.vector_root.display().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_follows_naming_convention() {
        let cat = Catalog::new("/v", "/m");
        let loc = cat.location("ITA_primary");
        assert_eq!(loc.vector_dir, PathBuf::from("/v/ITA_primary_vectors"));
        assert_eq!(loc.metadata_file, PathBuf::from("/m/ITA_primary_metadata.json"));
    }

    #[test]
    fn missing_root_lists_nothing() {
        let cat = Catalog::new("/definitely/not/here", "/nope");
        assert!(cat.documents().expect("documents").is_empty());
        assert!(matches!(cat.resolve("x"), Err(Error::NoIndex(_))));
    }
}
