//! Registry for managing news backends.

use std::collections::HashMap;
use std::sync::Arc;

use super::{newsapi::NewsApiSource, newsdata::NewsDataSource, NewsSource, SourceError};

bitflags::bitflags! {
    /// Capabilities that a backend can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const BROWSE = 1 << 0;
        const SEARCH = 1 << 1;
    }
}

/// Registry for all available news backends
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn NewsSource>>,
}

impl SourceRegistry {
    /// Create a registry with the built-in HTTP backends
    pub fn new() -> Result<Self, SourceError> {
        let mut registry = Self::empty();

        registry.register(Arc::new(NewsApiSource::new()?));
        registry.register(Arc::new(NewsDataSource::new()?));

        Ok(registry)
    }

    /// Create a registry with no backends
    pub fn empty() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Register a backend, replacing any with the same id
    pub fn register(&mut self, source: Arc<dyn NewsSource>) {
        self.sources.insert(source.id().to_string(), source);
    }

    /// Get a backend by id
    pub fn get(&self, id: &str) -> Option<&Arc<dyn NewsSource>> {
        self.sources.get(id)
    }

    /// Get a backend by id, returning an error if not found
    pub fn get_required(&self, id: &str) -> Result<&Arc<dyn NewsSource>, SourceError> {
        self.get(id)
            .ok_or_else(|| SourceError::InvalidRequest(format!("Source '{}' not found", id)))
    }

    /// Get all registered backends
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn NewsSource>> {
        self.sources.values()
    }

    /// Get all backend ids
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(|s| s.as_str())
    }

    /// Get backends that support search
    pub fn searchable(&self) -> Vec<&Arc<dyn NewsSource>> {
        self.all()
            .filter(|s| s.capabilities().contains(SourceCapabilities::SEARCH))
            .collect()
    }

    /// Check if a backend exists
    pub fn has(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    /// Get the number of registered backends
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
