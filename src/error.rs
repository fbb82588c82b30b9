use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::base64::DecodeError as Base64Error;
use crate::dotenv::Error as DotError;
use crate::jsonwebtoken::errors::Error as JsonWebTokenError;
use crate::thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("unauthorized")]
    Unauthorized,

    #[error("did not match data URI with image data")]
    InvalidImageFormat,

    #[error("invalid image type({0})")]
    UnsupportedImageType(String),

    #[error("failed to decode image: {0}")]
    DecodeError(#[from] Base64Error),

    #[error("invalid question data at position {position}: {reason}")]
    InvalidQuestionData { position: usize, reason: String },

    #[error("invalid survey data: {0}")]
    InvalidSurveyData(String),

    #[error("slug already taken({0})")]
    SlugConflict(String),

    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("jwt error")]
    JWTError(#[from] JsonWebTokenError),

    #[error("dotenv error")]
    DotEnvError(#[from] DotError),

    #[error("server error: {0}")]
    ServerError(String),
}

impl Error {
    pub fn invalid_question(position: usize, reason: impl Into<String>) -> Self {
        Self::InvalidQuestionData {
            position,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unauthorized | Self::JWTError(_) => StatusCode::UNAUTHORIZED,
            Self::SlugConflict(_) => StatusCode::CONFLICT,
            Self::InvalidImageFormat | Self::UnsupportedImageType(_) | Self::DecodeError(_) | Self::InvalidQuestionData { .. } | Self::InvalidSurveyData(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("{}", self);
            "server error".to_owned()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(ErrorBody { message })
    }
}
