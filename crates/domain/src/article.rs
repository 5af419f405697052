// crates/domain/src/article.rs

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use tracing::debug;
use uuid::Uuid;

use crate::config::{AppConfig, Article, BlockKind, ContentBlock, DEFAULT_COLOR};
use crate::error::ArticleError;

/// Reserved slug meaning "create a new article".
pub const NEW_ARTICLE_SLUG: &str = "new";

/// Number of books on one shelf of the bookshelf grid.
pub const SHELF_SIZE: usize = 6;

const HEADING_PLACEHOLDER: &str = "Heading";
const BODY_PLACEHOLDER: &str = "Write something...";
const ARTICLE_PLACEHOLDER: &str = "Start writing your article here...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Partial block fields merged into an existing block by `update_block`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<BlockKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Json>>,
}

fn block_id() -> String {
    format!("block-{}", Uuid::new_v4().simple())
}

/// Timestamps are persisted at millisecond precision.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

// ─────────────────────────────────────────────────────────────────────────────
// Articles within the document
// ─────────────────────────────────────────────────────────────────────────────

/// First article addressed by `slug` (by slug, then legacy link).
pub fn find_article<'a>(config: &'a AppConfig, slug: &str) -> Option<&'a Article> {
    config.articles.iter().find(|a| a.matches(slug))
}

/// A fresh article stamped with the current time.
pub fn create_article() -> Article {
    create_article_at(now())
}

pub fn create_article_at(now: DateTime<Utc>) -> Article {
    Article {
        title: "New Article".into(),
        author: "Author".into(),
        link: String::new(),
        color: DEFAULT_COLOR.into(),
        slug: Some(fresh_slug(now)),
        content: vec![ContentBlock {
            id: block_id(),
            kind: BlockKind::Paragraph,
            content: ARTICLE_PLACEHOLDER.into(),
            level: None,
            metadata: None,
        }],
        cover_image: None,
        published_at: Some(now),
        updated_at: Some(now),
    }
}

/// `article-{millis}-{suffix}`; the random suffix keeps articles created in
/// the same millisecond apart.
fn fresh_slug(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("article-{}-{}", now.timestamp_millis(), &suffix[..6])
}

fn slug_taken(config: &AppConfig, slug: &str, except: Option<usize>) -> bool {
    config
        .articles
        .iter()
        .enumerate()
        .any(|(i, a)| Some(i) != except && a.slug.as_deref() == Some(slug))
}

/// Store `article` under `slug`.
///
/// `"new"` appends. Any other slug replaces the first article matched by
/// `find_article`'s rule; when nothing matches the document is left as is and
/// `NotFound` is returned. Slug collisions with another article are refused,
/// unless the target keeps the slug it already had.
pub fn save_article(
    config: &AppConfig,
    slug: &str,
    article: Article,
) -> Result<AppConfig, ArticleError> {
    let target = if slug == NEW_ARTICLE_SLUG {
        None
    } else {
        let index = config
            .articles
            .iter()
            .position(|a| a.matches(slug))
            .ok_or_else(|| ArticleError::NotFound(slug.to_owned()))?;
        Some(index)
    };

    if let Some(new_slug) = article.slug.as_deref() {
        let unchanged =
            target.is_some_and(|i| config.articles[i].slug.as_deref() == Some(new_slug));
        if !unchanged && slug_taken(config, new_slug, target) {
            return Err(ArticleError::DuplicateSlug(new_slug.to_owned()));
        }
    }

    let mut next = config.clone();
    match target {
        Some(index) => next.articles[index] = article,
        None => next.articles.push(article),
    }
    Ok(next)
}

/// Array-splice removal of the article at `index`; out of range is a no-op.
pub fn remove_article(config: &AppConfig, index: usize) -> AppConfig {
    config.apply(&crate::patch::ConfigUpdate::RemoveArticle { index })
}

/// Articles grouped for display, `SHELF_SIZE` per shelf.
pub fn shelves(articles: &[Article]) -> Vec<&[Article]> {
    articles.chunks(SHELF_SIZE).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Blocks within an article
// ─────────────────────────────────────────────────────────────────────────────

fn touched(article: &Article, content: Vec<ContentBlock>) -> Article {
    Article {
        content,
        updated_at: Some(now()),
        ..article.clone()
    }
}

/// Append a placeholder block of `kind`.
pub fn add_block(article: &Article, kind: BlockKind) -> Article {
    let content = match kind {
        BlockKind::Heading => HEADING_PLACEHOLDER,
        BlockKind::Divider => "",
        _ => BODY_PLACEHOLDER,
    };
    let block = ContentBlock {
        id: block_id(),
        kind,
        content: content.into(),
        level: (kind == BlockKind::Heading).then_some(2),
        metadata: None,
    };

    debug!(%kind, "adding block");
    let mut blocks = article.content.clone();
    blocks.push(block);
    touched(article, blocks)
}

/// Shallow-merge `patch` into the block with `id`.
pub fn update_block(article: &Article, id: &str, patch: &BlockPatch) -> Article {
    let Some(index) = article.content.iter().position(|b| b.id == id) else {
        debug!(id, "update_block: no such block");
        return article.clone();
    };

    let mut blocks = article.content.clone();
    let block = &mut blocks[index];
    if let Some(kind) = patch.kind {
        block.kind = kind;
    }
    if let Some(content) = &patch.content {
        block.content = content.clone();
    }
    if let Some(level) = patch.level {
        block.level = Some(level);
    }
    if let Some(metadata) = &patch.metadata {
        block.metadata = Some(metadata.clone());
    }
    touched(article, blocks)
}

pub fn delete_block(article: &Article, id: &str) -> Article {
    if !article.content.iter().any(|b| b.id == id) {
        debug!(id, "delete_block: no such block");
        return article.clone();
    }
    let blocks = article
        .content
        .iter()
        .filter(|b| b.id != id)
        .cloned()
        .collect();
    touched(article, blocks)
}

/// Swap the block with its neighbour in `direction`.
///
/// The first block cannot move up and the last cannot move down.
pub fn move_block(article: &Article, id: &str, direction: Direction) -> Article {
    let Some(index) = article.content.iter().position(|b| b.id == id) else {
        return article.clone();
    };
    let neighbour = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => Some(index + 1).filter(|n| *n < article.content.len()),
    };
    let Some(neighbour) = neighbour else {
        return article.clone();
    };

    let mut blocks = article.content.clone();
    blocks.swap(index, neighbour);
    touched(article, blocks)
}
