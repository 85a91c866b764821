//! Error types shared by the gallery core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Storage rejected a write; in-memory state has been rolled back.
    #[error("Failed to save photos: {0}")]
    Persist(String),

    #[error("Rating must be between 1 and 10, got {0}")]
    InvalidRating(i64),

    #[error("A photo with id {0} already exists")]
    DuplicateId(u64),

    #[error("No photo ids left to assign")]
    IdsExhausted,

    #[error("Intake was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, GalleryError>;
