use crate::domain::identity::Identity;
use thiserror::Error;

/// Machine-checkable classification of a [`RegistryError`].
///
/// Collaborators match on this instead of destructuring error payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    SystemPaused,
    CallerNotFunded,
    AirlineNotEligible,
    AlreadyRegistered,
    DuplicateFlight,
    UnknownVoter,
    Validation,
    Config,
    Io,
    Internal,
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Caller {0} is not authorized for this operation")]
    Unauthorized(Identity),
    #[error("Registry is not operational")]
    SystemPaused,
    #[error("Caller {0} must be a registered and funded airline")]
    CallerNotFunded(Identity),
    #[error("Airline {0} is not eligible to register flights")]
    AirlineNotEligible(Identity),
    #[error("Airline {0} is already registered")]
    AlreadyRegistered(Identity),
    #[error("Flight {code} at {timestamp} is already registered for {airline}")]
    DuplicateFlight {
        airline: Identity,
        code: String,
        timestamp: u64,
    },
    #[error("Voter {0} is not a registered airline")]
    UnknownVoter(Identity),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::Unauthorized(_) => ErrorKind::Unauthorized,
            RegistryError::SystemPaused => ErrorKind::SystemPaused,
            RegistryError::CallerNotFunded(_) => ErrorKind::CallerNotFunded,
            RegistryError::AirlineNotEligible(_) => ErrorKind::AirlineNotEligible,
            RegistryError::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            RegistryError::DuplicateFlight { .. } => ErrorKind::DuplicateFlight,
            RegistryError::UnknownVoter(_) => ErrorKind::UnknownVoter,
            RegistryError::ValidationError(_) => ErrorKind::Validation,
            RegistryError::ConfigError(_) => ErrorKind::Config,
            RegistryError::CsvError(_) | RegistryError::IoError(_) => ErrorKind::Io,
            RegistryError::InternalError(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for RegistryError {
    fn from(err: rocksdb::Error) -> Self {
        RegistryError::InternalError(Box::new(err))
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::InternalError(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
