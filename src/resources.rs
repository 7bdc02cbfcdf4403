//! Resource registry lookups.
//!
//! Stylesheets are not read from the payload but fetched from the host's
//! registry by key. [`ResourceLoader`] turns whatever the registry returns
//! into text; the two registries here cover embedding ([`MemoryRegistry`])
//! and a directory on disk ([`FileRegistry`]).

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::context::EvaluationContext;
use crate::error::ResourceError;
use crate::logging::Logger;

/// A registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// A plain text entry.
    Text(String),
    /// An XML element stored in the registry, kept as serialized markup.
    Markup(String),
    /// Anything else.
    Binary(Vec<u8>),
}

impl Resource {
    /// Text for text entries, the string representation otherwise.
    pub fn into_text(self) -> String {
        match self {
            Resource::Text(text) | Resource::Markup(text) => text,
            Resource::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// Key-to-content lookup provided by the host.
pub trait ResourceRegistry {
    fn lookup(&self, key: &str) -> Result<Resource, ResourceError>;
}

/// A registry kept in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryRegistry {
    entries: HashMap<String, Resource>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, resource: Resource) {
        self.entries.insert(key.to_string(), resource);
    }

    pub fn with_text(mut self, key: &str, text: &str) -> Self {
        self.insert(key, Resource::Text(text.to_string()));
        self
    }
}

impl ResourceRegistry for MemoryRegistry {
    fn lookup(&self, key: &str) -> Result<Resource, ResourceError> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(key.to_string()))
    }
}

/// A registry rooted at a directory.
///
/// Keys may carry a `conf:` or `gov:` registry prefix, which is dropped.
/// Keys that would escape the root are reported as not found.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    root: PathBuf,
}

impl FileRegistry {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Option<PathBuf> {
        let relative = key
            .strip_prefix("conf:")
            .or_else(|| key.strip_prefix("gov:"))
            .unwrap_or(key)
            .trim_start_matches('/');
        let relative = Path::new(relative);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.as_os_str().is_empty() || escapes {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl ResourceRegistry for FileRegistry {
    fn lookup(&self, key: &str) -> Result<Resource, ResourceError> {
        let path = self
            .resolve(key)
            .ok_or_else(|| ResourceError::NotFound(key.to_string()))?;
        let bytes = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(key.to_string())
            } else {
                ResourceError::Io {
                    key: key.to_string(),
                    source: e,
                }
            }
        })?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => Resource::Text(text),
            Err(e) => Resource::Binary(e.into_bytes()),
        })
    }
}

/// Fetches stylesheet contents through the context's registry.
#[derive(Debug, Clone, Copy)]
pub struct ResourceLoader {
    logger: Logger,
}

impl ResourceLoader {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn load(&self, path: &str, ctx: &dyn EvaluationContext) -> Result<String, ResourceError> {
        let resource = ctx.resource(path)?;
        self.logger
            .debug(format_args!("Loaded registry resource {path}"));
        Ok(resource.into_text())
    }
}

impl Default for ResourceLoader {
    fn default() -> Self {
        Self::new(Logger::global("pdf_mediator::resources"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::XmlMessage;

    #[test]
    fn loader_returns_text_of_every_kind() {
        let mut registry = MemoryRegistry::new().with_text("css", "body{color:red}");
        registry.insert("xsl", Resource::Markup("<xsl:stylesheet/>".into()));
        registry.insert("bin", Resource::Binary(b"raw".to_vec()));
        let msg = XmlMessage::new("<payload/>", &registry).unwrap();
        let loader = ResourceLoader::default();

        assert_eq!(loader.load("css", &msg).unwrap(), "body{color:red}");
        assert_eq!(loader.load("xsl", &msg).unwrap(), "<xsl:stylesheet/>");
        assert_eq!(loader.load("bin", &msg).unwrap(), "raw");
    }

    #[test]
    fn missing_resource_is_an_error() {
        let registry = MemoryRegistry::new();
        let msg = XmlMessage::new("<payload/>", &registry).unwrap();
        let err = ResourceLoader::default().load("nope", &msg).unwrap_err();
        assert!(matches!(err, ResourceError::NotFound(k) if k == "nope"));
    }

    #[test]
    fn file_registry_strips_prefixes_and_blocks_traversal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("xsl")).unwrap();
        std::fs::write(dir.path().join("xsl/report.xsl"), "<x/>").unwrap();
        let registry = FileRegistry::new(dir.path());

        assert_eq!(
            registry.lookup("conf:/xsl/report.xsl").unwrap(),
            Resource::Text("<x/>".into())
        );
        assert_eq!(
            registry.lookup("xsl/report.xsl").unwrap(),
            Resource::Text("<x/>".into())
        );
        assert!(matches!(
            registry.lookup("gov:../secret"),
            Err(ResourceError::NotFound(_))
        ));
        assert!(matches!(
            registry.lookup("xsl/missing.xsl"),
            Err(ResourceError::NotFound(_))
        ));
    }
}
