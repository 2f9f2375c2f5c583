use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use parkside_engine::{AccountApiError, AuthApiError, PaymentApiError, ReservationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Auth token signature invalid or not provided")]
    CouldNotDeserializeAuthToken,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not serialize access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PolicyViolation(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializeAuthToken => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
                AuthError::AccountNotFound => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PolicyViolation(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Login token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Login token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("User account not found.")]
    AccountNotFound,
}

impl From<ReservationError> for ServerError {
    fn from(e: ReservationError) -> Self {
        match &e {
            ReservationError::DatabaseError(msg) => Self::BackendError(msg.clone()),
            ReservationError::LocationNotFound(_)
            | ReservationError::SpotNotFound(_)
            | ReservationError::BookingNotFound(_) => Self::NoRecordFound(e.to_string()),
            ReservationError::SpotUnavailable { .. } => Self::Conflict(e.to_string()),
            ReservationError::CancellationWindow | ReservationError::UserBlacklisted => {
                Self::PolicyViolation(e.to_string())
            },
            ReservationError::NegativePrice | ReservationError::InvalidTimeRange(_) => {
                Self::ValidationError(e.to_string())
            },
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match &e {
            AccountApiError::DatabaseError(msg) => Self::BackendError(msg.clone()),
            AccountApiError::UsernameTaken | AccountApiError::EmailTaken | AccountApiError::PhoneTaken => {
                Self::Conflict(e.to_string())
            },
            AccountApiError::UserNotFound(_) | AccountApiError::NoTrackedBooking => {
                Self::NoRecordFound(e.to_string())
            },
        }
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match &e {
            AuthApiError::DatabaseError(msg) => Self::BackendError(format!("Database error: {msg}")),
            AuthApiError::AccountNotFound => Self::AuthenticationError(AuthError::AccountNotFound),
            AuthApiError::Blacklisted => Self::PolicyViolation(e.to_string()),
            AuthApiError::RoleNotAllowed(_) => Self::InsufficientPermissions(e.to_string()),
        }
    }
}

impl From<PaymentApiError> for ServerError {
    fn from(e: PaymentApiError) -> Self {
        match &e {
            PaymentApiError::DatabaseError(msg) => Self::BackendError(msg.clone()),
            PaymentApiError::PaymentAlreadyExists(_) => Self::Conflict(e.to_string()),
            PaymentApiError::PaymentNotFound(_) => Self::NoRecordFound(e.to_string()),
        }
    }
}
