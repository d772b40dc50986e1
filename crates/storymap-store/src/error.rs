use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("map not found: {0}")]
    NotFound(String),

    #[error("map '{map}' contains duplicate place id {id}")]
    InvariantViolation { map: String, id: String },

    #[error("no place with id {0}")]
    PlaceNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
