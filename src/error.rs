use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Html(crate::templates::not_found_page())).into_response()
            },
            AppError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                let body = crate::templates::error_page(err.to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
            },
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
