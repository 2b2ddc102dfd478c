use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{TrellisError, TrellisResult};

/// Source of raw template text, keyed by logical path.
///
/// `Ok(None)` means the source does not exist; the parser treats that as an
/// empty template rather than an error. Implementations should reserve
/// `Err` for genuine failures (permissions, I/O, transport).
pub trait TemplateLoader {
    fn load(&self, path: &str) -> TrellisResult<Option<String>>;
}

/// Loads templates from a root directory on disk.
///
/// A leading `/` on the logical path is stripped; the remainder is resolved
/// relative to the root. `NotFound` maps to `Ok(None)`.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl TemplateLoader for FsLoader {
    fn load(&self, path: &str) -> TrellisResult<Option<String>> {
        match std::fs::read_to_string(self.resolve(path)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(TrellisError::Load {
                path: path.to_string(),
                source: err,
            }),
        }
    }
}

/// In-memory loader for tests and embedded hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    sources: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `text` under `path`, replacing any previous entry.
    pub fn insert<P: AsRef<str>, T: Into<String>>(&mut self, path: P, text: T) -> &mut Self {
        self.sources
            .insert(path.as_ref().trim_start_matches('/').to_string(), text.into());
        self
    }
}

impl TemplateLoader for MemoryLoader {
    fn load(&self, path: &str) -> TrellisResult<Option<String>> {
        Ok(self.sources.get(path.trim_start_matches('/')).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ntest::timeout(100)]
    fn memory_loader_strips_leading_separator() {
        let mut loader = MemoryLoader::new();
        loader.insert("/ui/button", "<b>{{label}}</b>");
        assert_eq!(
            loader.load("ui/button").unwrap().as_deref(),
            Some("<b>{{label}}</b>")
        );
        assert_eq!(
            loader.load("/ui/button").unwrap().as_deref(),
            Some("<b>{{label}}</b>")
        );
        assert_eq!(loader.load("ui/missing").unwrap(), None);
    }

    #[test]
    #[ntest::timeout(1000)]
    fn fs_loader_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FsLoader::new(dir.path());
        assert_eq!(loader.load("nope.html").unwrap(), None);

        std::fs::write(dir.path().join("page.html"), "Hello {{name}}").unwrap();
        assert_eq!(
            loader.load("/page.html").unwrap().as_deref(),
            Some("Hello {{name}}")
        );
    }
}
