// crates/serve/src/admin.rs
//! Operator endpoints. Everything edits the draft except `save` and `reset`.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::{
    article::{self, BlockPatch, Direction},
    AppConfig, Article, BlockKind, ConfigUpdate, PatchValue,
};
use serde::Deserialize;
use tracing::info;

use crate::{AppState, Error};

#[derive(Debug, Deserialize)]
pub struct FieldPatch {
    pub path: String,
    pub value: PatchValue,
}

#[derive(Debug, Deserialize)]
pub struct FieldQuery {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct NewBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
}

#[derive(Debug, Deserialize)]
pub struct MoveBlock {
    pub direction: Direction,
}

// ─────────────────────────────────────────────────────────────────────────────
// Document draft
// ─────────────────────────────────────────────────────────────────────────────

pub async fn get_draft(State(state): State<AppState>) -> Json<AppConfig> {
    Json(state.draft())
}

#[tracing::instrument(skip_all, fields(path = %q.path))]
pub async fn get_field(
    State(state): State<AppState>,
    Query(q): Query<FieldQuery>,
) -> Result<Json<PatchValue>, Error> {
    domain::patch::read(&state.draft(), &q.path)
        .map(Json)
        .ok_or(Error::NotFound(q.path))
}

/// Dotted-path edit, e.g. `{"path": "articles.1.title", "value": "Hello"}`.
#[tracing::instrument(skip_all, fields(path = %body.path))]
pub async fn patch_field(
    State(state): State<AppState>,
    Json(body): Json<FieldPatch>,
) -> Json<AppConfig> {
    Json(state.edit_draft(|d| domain::patch(d, &body.path, body.value.clone())))
}

#[tracing::instrument(skip_all)]
pub async fn apply_command(
    State(state): State<AppState>,
    Json(update): Json<ConfigUpdate>,
) -> Json<AppConfig> {
    Json(state.edit_draft(|d| d.apply(&update)))
}

#[tracing::instrument(skip_all)]
pub async fn save(State(state): State<AppState>) -> Json<AppConfig> {
    let draft = state.draft();
    state.store.update_config(draft).await;
    info!("draft committed");
    Json(state.store.current())
}

#[tracing::instrument(skip_all)]
pub async fn reset(State(state): State<AppState>) -> Json<AppConfig> {
    state.store.reset_config().await;
    info!("config reset to defaults");
    Json(state.resync_draft())
}

// ─────────────────────────────────────────────────────────────────────────────
// Articles and blocks
// ─────────────────────────────────────────────────────────────────────────────

pub async fn new_article() -> Json<Article> {
    Json(article::create_article())
}

fn store_article(state: &AppState, slug: &str, body: Article) -> Result<Json<Article>, Error> {
    let mut draft = state.draft.write();
    *draft = article::save_article(&draft, slug, body.clone())?;
    Ok(Json(body))
}

/// Append to the draft; see `put_article`.
#[tracing::instrument(skip_all)]
pub async fn put_new_article(
    State(state): State<AppState>,
    Json(body): Json<Article>,
) -> Result<Json<Article>, Error> {
    store_article(&state, article::NEW_ARTICLE_SLUG, body)
}

/// Store the article into the draft. Nothing reaches the cache or the remote
/// until `POST /api/admin/save` commits the draft.
#[tracing::instrument(skip_all, fields(%slug))]
pub async fn put_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<Article>,
) -> Result<Json<Article>, Error> {
    store_article(&state, &slug, body)
}

#[tracing::instrument(skip_all, fields(%slug))]
pub async fn add_block(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<NewBlock>,
) -> Result<Json<Article>, Error> {
    let edited = state.edit_article(&slug, |a| article::add_block(a, body.kind))?;
    Ok(Json(edited))
}

#[tracing::instrument(skip_all, fields(%slug, %id))]
pub async fn update_block(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    Json(patch): Json<BlockPatch>,
) -> Result<Json<Article>, Error> {
    let edited = state.edit_article(&slug, |a| article::update_block(a, &id, &patch))?;
    Ok(Json(edited))
}

#[tracing::instrument(skip_all, fields(%slug, %id))]
pub async fn delete_block(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<Article>, Error> {
    let edited = state.edit_article(&slug, |a| article::delete_block(a, &id))?;
    Ok(Json(edited))
}

#[tracing::instrument(skip_all, fields(%slug, %id))]
pub async fn move_block(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    Json(body): Json<MoveBlock>,
) -> Result<Json<Article>, Error> {
    let edited = state.edit_article(&slug, |a| article::move_block(a, &id, body.direction))?;
    Ok(Json(edited))
}
