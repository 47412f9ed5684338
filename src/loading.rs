//! Readiness signalling for asynchronously loaded assets (font catalogs, POI
//! tables).
//!
//! Loaders run elsewhere and flip a shared [`LoadSignal`]; the frame loop only
//! polls it, while callers that want to hold off submitting frames await it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_intrusive::sync::ManualResetEvent;

use crate::error::{LabelError, LabelResult};

/// One-shot completion flag for an asset load.
pub struct LoadSignal {
    name: String,
    event: ManualResetEvent,
    failure: Mutex<Option<String>>,
}

impl std::fmt::Debug for LoadSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadSignal")
            .field("name", &self.name)
            .field("loading", &self.is_loading())
            .finish()
    }
}

impl LoadSignal {
    /// A pending load.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            event: ManualResetEvent::new(false),
            failure: Mutex::new(None),
        })
    }

    /// An asset that is available immediately.
    pub fn loaded(name: impl Into<String>) -> Arc<Self> {
        let signal = Self::new(name);
        signal.complete();
        signal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mark the load as finished.
    pub fn complete(&self) {
        self.event.set();
    }

    /// Mark the load as failed. Waiters resolve with an error and dependants
    /// stay not-ready.
    pub fn fail(&self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("asset '{}' failed to load: {}", self.name, reason);
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(reason);
        self.event.set();
    }

    pub fn is_loading(&self) -> bool {
        !self.event.is_set()
    }

    /// Finished without failure.
    pub fn is_ready(&self) -> bool {
        self.event.is_set() && self.failure().is_none()
    }

    pub fn failure(&self) -> Option<String> {
        self.failure.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Resolve once the load finished.
    pub async fn wait(&self) -> LabelResult<()> {
        self.event.wait().await;
        match self.failure() {
            Some(reason) => Err(LabelError::asset_load(&self.name, reason)),
            None => Ok(()),
        }
    }
}

/// Font catalogs the glyph content of labels depends on.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    fonts: HashMap<String, Arc<LoadSignal>>,
    default_font: Option<String>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a font catalog load. The first registered catalog becomes
    /// the default for glyph runs that do not name one.
    pub fn register_font_catalog(&mut self, name: impl Into<String>) -> Arc<LoadSignal> {
        let name = name.into();
        let signal = self
            .fonts
            .entry(name.clone())
            .or_insert_with(|| LoadSignal::new(name.clone()))
            .clone();
        if self.default_font.is_none() {
            self.default_font = Some(name);
        }
        signal
    }

    pub fn font_signal(&self, name: &str) -> Option<&Arc<LoadSignal>> {
        self.fonts.get(name)
    }

    fn default_signal(&self) -> Option<&Arc<LoadSignal>> {
        self.default_font.as_deref().and_then(|name| self.fonts.get(name))
    }

    /// Whether glyphs from `catalog` (or the default catalog) can be drawn.
    /// An unregistered catalog falls back to the default one; a registry
    /// without fonts imposes no wait.
    pub fn is_font_ready(&self, catalog: Option<&str>) -> bool {
        let signal = match catalog {
            Some(name) => self.fonts.get(name).or_else(|| self.default_signal()),
            None => self.default_signal(),
        };
        signal.map_or(true, |s| s.is_ready())
    }

    /// Any font catalog still loading.
    pub fn loading(&self) -> bool {
        self.fonts.values().any(|s| s.is_loading())
    }

    /// Wait for every registered catalog.
    pub async fn wait_loaded(&self) -> LabelResult<()> {
        for signal in self.fonts.values() {
            signal.wait().await?;
        }
        Ok(())
    }

    /// Wait for the default catalog only.
    pub async fn wait_initialized(&self) -> LabelResult<()> {
        match self.default_signal() {
            Some(signal) => signal.wait().await,
            None => Ok(()),
        }
    }
}
