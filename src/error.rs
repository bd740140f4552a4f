use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotInitialized,
    InvalidTransition,
    StaleModule,
    DraftNotFound,
    RequestNotFound,
    NotificationNotFound,
    TripNotFound,
    InvalidSnapshot,
    ValidationError,
    StorageError,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::StaleModule => "STALE_MODULE",
            Self::DraftNotFound => "DRAFT_NOT_FOUND",
            Self::RequestNotFound => "REQUEST_NOT_FOUND",
            Self::NotificationNotFound => "NOTIFICATION_NOT_FOUND",
            Self::TripNotFound => "TRIP_NOT_FOUND",
            Self::InvalidSnapshot => "INVALID_SNAPSHOT",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::StorageError => "STORAGE_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct TripwizError {
    pub code: ErrorCode,
    pub message: String,
}

impl TripwizError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_initialized() -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            "tripwiz is not initialized. Run `tripwiz init` first.",
        )
    }

    pub fn invalid_transition(state: &str, action: &str) -> Self {
        Self::new(
            ErrorCode::InvalidTransition,
            format!("Cannot {action} while wizard is {state}"),
        )
    }

    pub fn stale_module(requested: &str, current: &str) -> Self {
        Self::new(
            ErrorCode::StaleModule,
            format!("Module {requested} is not the current module ({current})"),
        )
    }

    pub fn request_not_pending(id: &str, status: &str) -> Self {
        Self::new(
            ErrorCode::InvalidTransition,
            format!("Join request {id} was already {status}"),
        )
    }

    pub fn draft_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::DraftNotFound,
            format!("Draft not found: {reference}"),
        )
    }

    pub fn request_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::RequestNotFound,
            format!("Join request not found: {reference}"),
        )
    }

    pub fn notification_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::NotificationNotFound,
            format!("Notification not found: {reference}"),
        )
    }

    pub fn trip_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::TripNotFound,
            format!("Trip not found: {reference}"),
        )
    }

    pub fn invalid_snapshot(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidSnapshot,
            format!("Invalid wizard snapshot: {}", reason.into()),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl From<rusqlite::Error> for TripwizError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}

impl From<serde_json::Error> for TripwizError {
    fn from(e: serde_json::Error) -> Self {
        Self::storage(e.to_string())
    }
}
