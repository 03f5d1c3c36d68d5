//! Golden document loader
//!
//! Goldens live at `<root>/<group>/<resource>`. Every low-level failure
//! (missing file, permission error, non-UTF-8 content) collapses into one
//! error kind: a golden the case cannot read is a missing resource, and the
//! case fails before any request is sent.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use platecheck_core::AssertionContract;

#[derive(Debug, thiserror::Error)]
pub enum GoldenError {
    #[error("golden document not available: {path}: {reason}")]
    ResourceNotFound { path: PathBuf, reason: String },
}

/// Loads golden documents from a fixtures root.
#[derive(Debug, Clone)]
pub struct GoldenLoader {
    root: PathBuf,
}

impl GoldenLoader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolved path for a `group/resource` pair.
    #[must_use]
    pub fn path(&self, group: &str, resource: &str) -> PathBuf {
        self.root.join(group).join(resource)
    }

    /// Load one golden document as UTF-8 text. The file handle is released
    /// before returning.
    ///
    /// # Errors
    ///
    /// Returns [`GoldenError::ResourceNotFound`] when the file is missing,
    /// unreadable, or not valid UTF-8.
    pub fn load(&self, group: &str, resource: &str) -> Result<String, GoldenError> {
        let path = self.path(group, resource);
        let bytes = std::fs::read(&path).map_err(|e| GoldenError::ResourceNotFound {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        String::from_utf8(bytes).map_err(|e| GoldenError::ResourceNotFound {
            path,
            reason: e.to_string(),
        })
    }

    /// Load every golden a contract references, keyed `group/resource`.
    /// The first missing document aborts the whole preload.
    ///
    /// # Errors
    ///
    /// Returns the first [`GoldenError::ResourceNotFound`] encountered.
    pub fn preload(
        &self,
        contract: &AssertionContract,
    ) -> Result<BTreeMap<String, String>, GoldenError> {
        let mut goldens = BTreeMap::new();
        for (group, resource) in contract.golden_refs() {
            let text = self.load(&group, &resource)?;
            goldens.insert(format!("{group}/{resource}"), text);
        }
        Ok(goldens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platecheck_core::CompareOptions;

    fn loader_with(group: &str, resource: &str, content: &[u8]) -> (tempfile::TempDir, GoldenLoader) {
        let dir = tempfile::tempdir().unwrap();
        let group_dir = dir.path().join(group);
        std::fs::create_dir_all(&group_dir).unwrap();
        std::fs::write(group_dir.join(resource), content).unwrap();
        let loader = GoldenLoader::new(dir.path());
        (dir, loader)
    }

    #[test]
    fn load_existing_document() {
        let (_dir, loader) = loader_with("recipes", "expected.json", br#"{"results": []}"#);
        let text = loader.load("recipes", "expected.json").unwrap();
        assert_eq!(text, r#"{"results": []}"#);
    }

    #[test]
    fn missing_document_is_resource_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = GoldenLoader::new(dir.path());
        let err = loader.load("recipes", "expected.json").unwrap_err();
        let GoldenError::ResourceNotFound { path, .. } = err;
        assert!(path.ends_with("recipes/expected.json"));
    }

    #[test]
    fn invalid_utf8_is_resource_not_found() {
        let (_dir, loader) = loader_with("recipes", "expected.json", &[0xff, 0xfe, 0x00]);
        assert!(loader.load("recipes", "expected.json").is_err());
    }

    #[test]
    fn preload_collects_referenced_goldens() {
        let (_dir, loader) = loader_with("shoppinglist", "added.json", b"{}");
        let contract = AssertionContract::new()
            .status(200)
            .matches_golden("shoppinglist", "added.json", CompareOptions::ignoring_values());
        let goldens = loader.preload(&contract).unwrap();
        assert_eq!(goldens.get("shoppinglist/added.json").map(String::as_str), Some("{}"));
    }

    #[test]
    fn preload_fails_on_first_missing_golden() {
        let (_dir, loader) = loader_with("shoppinglist", "added.json", b"{}");
        let contract = AssertionContract::new()
            .matches_golden("shoppinglist", "added.json", CompareOptions::default())
            .matches_golden("recipes", "expected.json", CompareOptions::default());
        assert!(loader.preload(&contract).is_err());
    }

    #[test]
    fn contract_without_goldens_preloads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loader = GoldenLoader::new(dir.path());
        let contract = AssertionContract::new().status(200);
        assert!(loader.preload(&contract).unwrap().is_empty());
    }
}
