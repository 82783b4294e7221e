//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::ProductStore;
use crate::media::MediaPipeline;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn ProductStore>,
    media: MediaPipeline,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Product persistence backend
    /// * `media` - Pipeline for the configured media mode
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>, media: MediaPipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store, media }),
        }
    }

    /// Get a reference to the product store.
    #[must_use]
    pub fn store(&self) -> &dyn ProductStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the media pipeline.
    #[must_use]
    pub fn media(&self) -> &MediaPipeline {
        &self.inner.media
    }
}
