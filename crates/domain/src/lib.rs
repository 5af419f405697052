pub mod article;
pub mod config;
pub mod error;
pub mod patch;
pub mod setting;

pub use article::{BlockPatch, Direction, NEW_ARTICLE_SLUG};
pub use config::{merge, AppConfig, Article, BlockKind, ButtonConfig, ContentBlock};
pub use error::{ArticleError, UnknownFieldError};
pub use patch::{patch, ConfigUpdate, FieldRef, PatchValue};
