use actix_web::{http::StatusCode, HttpResponse};
use serde_json::json;

#[derive(Debug)]
pub struct ServiceError {
    pub code: u16,
    err: anyhow::Error,
}

impl ServiceError {
    pub fn new(code: u16, err: anyhow::Error) -> Self {
        Self { code, err }
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.err
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl actix_web::error::ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self.code {
            400 => StatusCode::BAD_REQUEST,
            401 => StatusCode::UNAUTHORIZED,
            404 => StatusCode::NOT_FOUND,
            code => StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.code >= 500 {
            log::error!("{:#}", self.err);
        } else {
            log::info!("Request failed with {}: {}", self.code, self.err);
        }

        HttpResponse::build(self.status_code()).json(json!({ "error": self.err.to_string() }))
    }
}

impl<E: Into<anyhow::Error>> From<E> for ServiceError {
    fn from(err: E) -> ServiceError {
        ServiceError {
            code: 500,
            err: err.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

pub trait AddCode {
    type Output;
    fn code(self, code: u16) -> Self::Output;
}

impl AddCode for anyhow::Error {
    type Output = ServiceError;

    fn code(self, code: u16) -> ServiceError {
        ServiceError { code, err: self }
    }
}

impl<T> AddCode for std::result::Result<T, anyhow::Error> {
    type Output = Result<T>;

    fn code(self, code: u16) -> Result<T> {
        self.map_err(|err| err.code(code))
    }
}

/// Adds a message on top of a [`ServiceError`], keeping its status code.
pub trait WithMessage<T> {
    fn with_message(self, message: &'static str) -> Result<T>;
}

impl<T> WithMessage<T> for Result<T> {
    fn with_message(self, message: &'static str) -> Result<T> {
        self.map_err(|e| ServiceError {
            code: e.code,
            err: e.err.context(message),
        })
    }
}
