use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CodecError, Result};

use super::backend::EncoderBackend;
use super::backends::StubBackend;

/// Named encoder backends.
///
/// Backends only hand out new instances, so they are shared without locking; each opened
/// instance belongs to exactly one session.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn EncoderBackend>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Registry holding every backend compiled into this build.
    ///
    /// The default is the first real encoder available, falling back to `stub`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        #[cfg(feature = "encoder-ffmpeg")]
        registry.register(super::backends::X264Backend::new());
        #[cfg(feature = "encoder-openh264")]
        registry.register(super::backends::OpenH264Backend::new());
        registry.register(StubBackend::new());
        registry
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: EncoderBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Arc::new(backend));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(CodecError::invalid(format!(
                "encoder backend '{}' not registered",
                name
            )));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn EncoderBackend>> {
        self.backends.get(name).cloned()
    }

    pub fn default_backend(&self) -> Option<Arc<dyn EncoderBackend>> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    /// Look up `name`, or the default when `None`.
    pub fn select(&self, name: Option<&str>) -> Result<Arc<dyn EncoderBackend>> {
        let backend = match name {
            Some(name) => self.get(name),
            None => self.default_backend(),
        };
        backend.ok_or_else(|| {
            CodecError::invalid(format!(
                "encoder backend '{}' not registered (available: {})",
                name.unwrap_or("<default>"),
                self.list().join(", ")
            ))
        })
    }

    /// Registered backend names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
