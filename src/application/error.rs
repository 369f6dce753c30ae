use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{
    application::{repos::RepoError, seed::SeedError},
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Diagnostic attached to failed responses and picked up by `log_responses`.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Message safe to show to API clients; details stay in the logs.
    pub fn presentation_message(&self) -> String {
        match self {
            AppError::Domain(DomainError::Validation { message }) => message.clone(),
            AppError::Validation(message) => message.clone(),
            AppError::Repo(RepoError::Duplicate { .. }) => "Duplicate record".to_string(),
            AppError::Repo(RepoError::InvalidInput { .. }) => "Invalid input".to_string(),
            AppError::Repo(RepoError::NotFound) => "Resource not found".to_string(),
            AppError::Repo(RepoError::Timeout) | AppError::Infra(InfraError::Database { .. }) => {
                "Service temporarily unavailable".to_string()
            }
            AppError::Repo(_) | AppError::Seed(_) => "Persistence error".to_string(),
            AppError::Infra(_) | AppError::Unexpected(_) => "Unexpected error occurred".to_string(),
        }
    }

    /// Short machine-readable classification, exposed as a GraphQL error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::Validation { .. }) | AppError::Validation(_) => {
                "BAD_USER_INPUT"
            }
            AppError::Repo(RepoError::Duplicate { .. }) => "CONFLICT",
            AppError::Repo(RepoError::NotFound) => "NOT_FOUND",
            AppError::Repo(RepoError::InvalidInput { .. }) => "BAD_USER_INPUT",
            AppError::Repo(RepoError::Timeout) | AppError::Infra(InfraError::Database { .. }) => {
                "SERVICE_UNAVAILABLE"
            }
            _ => "INTERNAL_SERVER_ERROR",
        }
    }
}
