use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use puppylove_engine::{AdminApiError, HeartsApiError, MatchmakingError, ProfileApiError, ProfileError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("The {0} header is missing or invalid")]
    MissingIdentity(&'static str),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    ProtocolViolation(String),
    #[error("{0}")]
    NotAllowed(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::MissingIdentity(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::ProtocolViolation(_) => StatusCode::FORBIDDEN,
            Self::NotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<MatchmakingError> for ServerError {
    fn from(e: MatchmakingError) -> Self {
        match e {
            MatchmakingError::TooManyHearts { .. } | MatchmakingError::DuplicateHeart | MatchmakingError::Draft(_) => {
                Self::ValidationError(e.to_string())
            },
            MatchmakingError::InvalidClaim |
            MatchmakingError::ClaimNotFound |
            MatchmakingError::UnauthorizedReturn(_) => Self::ProtocolViolation(e.to_string()),
            MatchmakingError::AlreadySubmitted => Self::NotAllowed(e.to_string()),
            MatchmakingError::ProfileNotFound(_) => Self::NoRecordFound(e.to_string()),
            MatchmakingError::DatabaseError(_) |
            MatchmakingError::ReturnPersistFailed(_) |
            MatchmakingError::ClaimsLog(_) |
            MatchmakingError::MissingProfileForMatch(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<ProfileError> for ServerError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::ProfileNotFound(_) => Self::NoRecordFound(e.to_string()),
            ProfileError::AlreadyRegistered(_) => Self::NotAllowed(e.to_string()),
            ProfileError::PublicKeyInUse => Self::ValidationError(e.to_string()),
            ProfileError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<HeartsApiError> for ServerError {
    fn from(e: HeartsApiError) -> Self {
        match e {
            HeartsApiError::Matchmaking(e) => e.into(),
            HeartsApiError::ProfileNotFound(_) => Self::NoRecordFound(e.to_string()),
            HeartsApiError::GenderNotSet(_) => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<ProfileApiError> for ServerError {
    fn from(e: ProfileApiError) -> Self {
        match e {
            ProfileApiError::Profile(e) => e.into(),
            ProfileApiError::Config(e) => Self::BackendError(e.to_string()),
            ProfileApiError::InvalidGender(_) | ProfileApiError::TooLong { .. } => Self::ValidationError(e.to_string()),
            ProfileApiError::ProfileNotFound(_) => Self::NoRecordFound(e.to_string()),
            ProfileApiError::ResultsPublished => Self::InsufficientPermissions(e.to_string()),
        }
    }
}

impl From<AdminApiError> for ServerError {
    fn from(e: AdminApiError) -> Self {
        match e {
            AdminApiError::Config(e) => Self::BackendError(e.to_string()),
            AdminApiError::Matchmaking(e) => e.into(),
            AdminApiError::Profile(e) => e.into(),
            AdminApiError::Inactive | AdminApiError::NotPermitted => Self::InsufficientPermissions(e.to_string()),
        }
    }
}
