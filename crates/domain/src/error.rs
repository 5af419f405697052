use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArticleError {
    #[error("no article matches slug `{0}`")]
    NotFound(String),

    #[error("slug `{0}` is already used by another article")]
    DuplicateSlug(String),
}

/// A dotted path that names a known container but no field inside it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("path `{0}` does not address an editable field")]
pub struct UnknownFieldError(pub String);
