use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::classifier::ClassifierError;
use crate::store::StorageError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Classification(#[from] ClassifierError),

    #[error("{0}")]
    NotFound(String),

    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<BlockingError> for ServiceError {
    fn from(e: BlockingError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

#[derive(Serialize)]
pub(crate) struct ErrorBody<'a> {
    pub detail: &'a str,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Storage(StorageError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Classification(ClassifierError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Classification(_) => StatusCode::BAD_GATEWAY,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::DataIntegrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ServiceError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { detail: &message })
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
