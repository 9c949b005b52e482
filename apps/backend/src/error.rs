use actix_web::error::ResponseError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

use crate::errors::domain::DomainError;

#[derive(Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {detail}")]
    Validation {
        code: &'static str,
        detail: String,
        status: StatusCode,
    },
    #[error("Not found: {detail}")]
    NotFound { code: &'static str, detail: String },
    #[error("Bad request: {detail}")]
    BadRequest { code: &'static str, detail: String },
    #[error("Conflict: {detail}")]
    Conflict { code: &'static str, detail: String },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    fn code(&self) -> String {
        match self {
            AppError::Validation { code, .. } => code.to_string(),
            AppError::NotFound { code, .. } => code.to_string(),
            AppError::BadRequest { code, .. } => code.to_string(),
            AppError::Conflict { code, .. } => code.to_string(),
            AppError::Internal { .. } => "INTERNAL".to_string(),
            AppError::Config { .. } => "CONFIG_ERROR".to_string(),
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Validation { detail, .. } => detail.clone(),
            AppError::NotFound { detail, .. } => detail.clone(),
            AppError::BadRequest { detail, .. } => detail.clone(),
            AppError::Conflict { detail, .. } => detail.clone(),
            AppError::Internal { detail, .. } => detail.clone(),
            AppError::Config { detail, .. } => detail.clone(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { status, .. } => *status,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid(code: &'static str, detail: String) -> Self {
        Self::Validation {
            code,
            detail,
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn bad_request(code: &'static str, detail: String) -> Self {
        Self::BadRequest { code, detail }
    }

    pub fn not_found(code: &'static str, detail: String) -> Self {
        Self::NotFound { code, detail }
    }

    pub fn conflict(code: &'static str, detail: String) -> Self {
        Self::Conflict { code, detail }
    }

    pub fn internal(detail: String) -> Self {
        Self::Internal { detail }
    }

    pub fn config(detail: String) -> Self {
        Self::Config { detail }
    }

    fn humanize_code(code: &str) -> String {
        code.split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<std::env::VarError> for AppError {
    fn from(e: std::env::VarError) -> Self {
        AppError::internal(format!("env var error: {e}"))
    }
}

impl From<actix_web::Error> for AppError {
    fn from(e: actix_web::Error) -> Self {
        AppError::internal(format!("http error: {e}"))
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(detail) => AppError::invalid("DOMAIN_VALIDATION", detail),
            DomainError::NotFound(_, detail) => AppError::not_found("DOMAIN_NOT_FOUND", detail),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let code = self.code();
        let detail = self.detail();

        let problem_details = ProblemDetails {
            type_: format!("https://duel21.app/errors/{}", code.to_uppercase()),
            title: Self::humanize_code(&code),
            status: status.as_u16(),
            detail,
            code,
        };

        HttpResponse::build(status)
            .content_type("application/problem+json")
            .json(problem_details)
    }
}
