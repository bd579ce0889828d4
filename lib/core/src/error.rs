use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Business not found: {0}")]
    BusinessNotFound(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid coordinate: longitude {longitude}, latitude {latitude}")]
    InvalidCoordinate { longitude: f64, latitude: f64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// A derived field is absent on a record that should carry it.
    pub fn missing_field(record_id: &str, field: &str) -> Self {
        Error::Computation(format!("{} has no {}; rerun preprocessing", record_id, field))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
