// crates/serve/src/api.rs
//! Read-only views of the stored document.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::{article, AppConfig, Article, ArticleError};

use crate::{AppState, Error};

#[tracing::instrument(skip_all)]
pub async fn get_config(State(state): State<AppState>) -> Json<AppConfig> {
    Json(state.store.current())
}

/// Articles in shelves of `SHELF_SIZE`.
#[tracing::instrument(skip_all)]
pub async fn get_shelves(State(state): State<AppState>) -> Json<Vec<Vec<Article>>> {
    let config = state.store.current();
    let shelves = article::shelves(&config.articles)
        .into_iter()
        .map(<[Article]>::to_vec)
        .collect();
    Json(shelves)
}

#[tracing::instrument(skip_all, fields(%slug))]
pub async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Article>, Error> {
    let config = state.store.current();
    article::find_article(&config, &slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| ArticleError::NotFound(slug).into())
}
