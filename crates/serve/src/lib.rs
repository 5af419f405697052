pub mod admin;
pub mod api;
pub mod routes;
pub mod state;

pub use routes::{build_app, serve};
pub use state::AppState;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use domain::ArticleError;
use http::StatusCode;
use serde_json::json;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Article(#[from] ArticleError),

    #[error("nothing at `{0}`")]
    NotFound(String),
}

impl Error {
    pub fn to_status(&self) -> StatusCode {
        match self {
            Error::Article(ArticleError::NotFound(_)) | Error::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Error::Article(ArticleError::DuplicateSlug(_)) => StatusCode::CONFLICT,
            Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.to_status();
        let body = match status {
            StatusCode::NOT_FOUND => json!({ "error": "not found" }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
