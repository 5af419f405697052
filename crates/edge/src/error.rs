use adapt::{CacheError, StoreError};
use serve::Error as ServeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("remote store error: {0}")]
    Store(#[from] StoreError),

    #[error("serve error: {0}")]
    Serve(#[from] ServeError),
}
