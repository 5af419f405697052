// crates/serve/src/routes.rs

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::{admin, api, AppState, Error};

#[tracing::instrument(skip_all)]
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/config", get(api::get_config))
        .route("/api/shelves", get(api::get_shelves))
        .route("/api/articles/{slug}", get(api::get_article))
        .route("/api/admin/draft", get(admin::get_draft))
        .route(
            "/api/admin/draft/field",
            get(admin::get_field).patch(admin::patch_field),
        )
        .route("/api/admin/draft/commands", post(admin::apply_command))
        .route("/api/admin/save", post(admin::save))
        .route("/api/admin/reset", post(admin::reset))
        // Static segment wins over `{slug}`.
        .route(
            "/api/admin/articles/new",
            get(admin::new_article).put(admin::put_new_article),
        )
        .route("/api/admin/articles/{slug}", put(admin::put_article))
        .route("/api/admin/articles/{slug}/blocks", post(admin::add_block))
        .route(
            "/api/admin/articles/{slug}/blocks/{id}",
            patch(admin::update_block).delete(admin::delete_block),
        )
        .route(
            "/api/admin/articles/{slug}/blocks/{id}/move",
            post(admin::move_block),
        )
        .with_state(state)
}

/// Bind `addr` and serve until the process is interrupted.
#[tracing::instrument(skip_all, fields(%addr))]
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), Error> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "admin API listening");
    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt::{ConfigStore, MemoryCache};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use domain::{AppConfig, Article, BlockKind};
    use serde_json::{json, Value as Json};
    use std::sync::Arc;
    use tower::ServiceExt; // oneshot

    async fn app_with(articles: Vec<Article>) -> (Router, AppState) {
        let store = Arc::new(ConfigStore::new(None, Arc::new(MemoryCache::new())));
        store.load().await;
        let mut cfg = AppConfig::default();
        cfg.articles = articles;
        store.update_config(cfg).await;

        let state = AppState::new(store);
        (build_app(state.clone()), state)
    }

    fn article(slug: &str, blocks: &[&str]) -> Article {
        let mut a = domain::article::create_article();
        a.slug = Some(slug.into());
        a.title = slug.to_uppercase();
        a.content = blocks
            .iter()
            .map(|id| domain::ContentBlock {
                id: (*id).into(),
                kind: BlockKind::Paragraph,
                content: (*id).into(),
                level: None,
                metadata: None,
            })
            .collect();
        a
    }

    async fn read(resp: Response) -> (StatusCode, Json) {
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
        (status, body)
    }

    async fn call(app: &Router, method: &str, path: &str, body: Option<Json>) -> (StatusCode, Json) {
        let builder = Request::builder().method(method).uri(path);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        read(app.clone().oneshot(req).await.unwrap()).await
    }

    fn block_ids(article: &Json) -> Vec<String> {
        article["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["id"].as_str().unwrap().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn reads_config_and_articles() {
        let (app, _) = app_with(vec![article("a", &[]), article("b", &[])]).await;

        let (status, cfg) = call(&app, "GET", "/api/config", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cfg["heroTitle"], "The Hideout.");

        let (status, b) = call(&app, "GET", "/api/articles/b", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(b["title"], "B");

        let (status, body) = call(&app, "GET", "/api/articles/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not found");
    }

    #[tokio::test]
    async fn shelves_are_groups_of_six() {
        let articles = (0..7).map(|i| article(&format!("s{i}"), &[])).collect();
        let (app, _) = app_with(articles).await;
        let (_, shelves) = call(&app, "GET", "/api/shelves", None).await;
        let sizes: Vec<usize> = shelves
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s.as_array().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![6, 1]);
    }

    #[tokio::test]
    async fn draft_edits_stay_local_until_saved() {
        let (app, state) = app_with(vec![article("a", &[]), article("b", &[])]).await;

        let (status, draft) = call(
            &app,
            "PATCH",
            "/api/admin/draft/field",
            Some(json!({ "path": "articles.1.title", "value": "Hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["articles"][1]["title"], "Hello");
        assert_eq!(state.store.current().articles[1].title, "B");

        let (status, value) =
            call(&app, "GET", "/api/admin/draft/field?path=articles.1.title", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, "Hello");
        let (status, _) =
            call(&app, "GET", "/api/admin/draft/field?path=articles.9.title", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, saved) = call(&app, "POST", "/api/admin/save", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["articles"][1]["title"], "Hello");
        assert_eq!(state.store.current().articles[1].title, "Hello");
    }

    #[tokio::test]
    async fn typed_commands_edit_the_draft() {
        let (app, _) = app_with(vec![article("a", &[])]).await;

        let (_, draft) = call(
            &app,
            "POST",
            "/api/admin/draft/commands",
            Some(json!({ "op": "addBody2Button" })),
        )
        .await;
        let buttons = draft["body2"]["buttons"].as_array().unwrap();
        assert_eq!(buttons.last().unwrap()["label"], "New Button");

        let (_, draft) = call(
            &app,
            "POST",
            "/api/admin/draft/commands",
            Some(json!({ "op": "removeArticle", "index": 0 })),
        )
        .await;
        assert!(draft["articles"].as_array().unwrap().is_empty());

        let (status, _) = call(
            &app,
            "POST",
            "/api/admin/draft/commands",
            Some(json!({ "op": "explode" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn reset_restores_defaults_and_resyncs_draft() {
        let (app, state) = app_with(vec![article("a", &[])]).await;
        call(
            &app,
            "PATCH",
            "/api/admin/draft/field",
            Some(json!({ "path": "heroTitle", "value": "Unsaved" })),
        )
        .await;

        let (status, cfg) = call(&app, "POST", "/api/admin/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cfg["heroTitle"], "The Hideout.");
        assert_eq!(state.store.current(), AppConfig::default());
        assert_eq!(state.draft(), AppConfig::default());
    }

    #[tokio::test]
    async fn new_article_then_save_into_draft() {
        let (app, state) = app_with(vec![article("a", &[])]).await;

        let (status, mut fresh) = call(&app, "GET", "/api/admin/articles/new", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fresh["content"].as_array().unwrap().len(), 1);

        fresh["slug"] = json!("fresh");
        let (status, _) = call(&app, "PUT", "/api/admin/articles/new", Some(fresh.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.draft().articles.len(), 2);
        // Drafted only; the stored document changes on save.
        assert_eq!(state.store.current().articles.len(), 1);

        // Same slug again collides.
        let (status, _) = call(&app, "PUT", "/api/admin/articles/new", Some(fresh.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(&app, "PUT", "/api/admin/articles/ghost", Some(fresh)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn block_editing_flow() {
        let (app, state) = app_with(vec![article("a", &["b1", "b2"])]).await;

        let (status, a) = call(
            &app,
            "POST",
            "/api/admin/articles/a/blocks",
            Some(json!({ "type": "divider" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let ids = block_ids(&a);
        assert_eq!(ids.len(), 3);
        assert_eq!(a["content"][2]["content"], "");

        let (_, a) = call(
            &app,
            "POST",
            "/api/admin/articles/a/blocks/b2/move",
            Some(json!({ "direction": "up" })),
        )
        .await;
        assert_eq!(block_ids(&a), vec!["b2", "b1", ids[2].as_str()]);

        let (_, a) = call(
            &app,
            "PATCH",
            "/api/admin/articles/a/blocks/b1",
            Some(json!({ "type": "heading", "level": 1 })),
        )
        .await;
        assert_eq!(a["content"][1]["type"], "heading");
        assert_eq!(a["content"][1]["level"], 1);

        let (_, a) = call(&app, "DELETE", "/api/admin/articles/a/blocks/b2", None).await;
        assert_eq!(block_ids(&a)[0], "b1");

        assert_eq!(state.draft().articles[0].content.len(), 2);
        // Unsaved: the stored article is untouched.
        let stored = &state.store.current().articles[0];
        assert_eq!(stored.content.len(), 2);
        assert_eq!(stored.content[0].id, "b1");
    }

    #[tokio::test]
    async fn articles_sharing_a_slug_stay_editable() {
        let (app, state) = app_with(vec![article("dup", &["b1"]), article("dup", &[])]).await;

        let (status, a) = call(
            &app,
            "POST",
            "/api/admin/articles/dup/blocks",
            Some(json!({ "type": "quote" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(block_ids(&a).len(), 2);

        let mut edited = a.clone();
        edited["title"] = json!("Renamed");
        let (status, _) = call(&app, "PUT", "/api/admin/articles/dup", Some(edited)).await;
        assert_eq!(status, StatusCode::OK);

        let draft = state.draft();
        assert_eq!(draft.articles[0].title, "Renamed");
        assert_eq!(draft.articles[1].title, "DUP");
    }

    #[tokio::test]
    async fn unknown_block_type_is_rejected() {
        let (app, _) = app_with(vec![article("a", &[])]).await;
        let (status, _) = call(
            &app,
            "POST",
            "/api/admin/articles/a/blocks",
            Some(json!({ "type": "video" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(
            &app,
            "POST",
            "/api/admin/articles/missing/blocks",
            Some(json!({ "type": "quote" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
