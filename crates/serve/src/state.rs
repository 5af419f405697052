// crates/serve/src/state.rs

use adapt::ConfigStore;
use domain::{AppConfig, Article, ArticleError};
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared handler state.
///
/// `draft` is the operator's working copy. Edits land there and reach the
/// store only on an explicit save.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConfigStore>,
    pub draft: Arc<RwLock<AppConfig>>,
}

impl AppState {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        let draft = Arc::new(RwLock::new(store.current()));
        Self { store, draft }
    }

    pub fn draft(&self) -> AppConfig {
        self.draft.read().clone()
    }

    /// Drop unsaved edits and start again from the stored document.
    pub fn resync_draft(&self) -> AppConfig {
        let current = self.store.current();
        *self.draft.write() = current.clone();
        current
    }

    /// Apply `f` to the draft.
    pub fn edit_draft<F>(&self, f: F) -> AppConfig
    where
        F: FnOnce(&AppConfig) -> AppConfig,
    {
        let mut draft = self.draft.write();
        let next = f(&draft);
        *draft = next.clone();
        next
    }

    /// Replace the draft article addressed by `slug` with `f` of it.
    pub fn edit_article<F>(&self, slug: &str, f: F) -> Result<Article, ArticleError>
    where
        F: FnOnce(&Article) -> Article,
    {
        let mut draft = self.draft.write();
        let article = domain::article::find_article(&draft, slug)
            .ok_or_else(|| ArticleError::NotFound(slug.to_owned()))?;
        let edited = f(article);
        let next = domain::article::save_article(&draft, slug, edited.clone())?;
        *draft = next;
        Ok(edited)
    }
}
