use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures from the layers around the engine (storage, config, fetch).
/// Fetch implementations report their own failures through `Fetch`.
/// The view pipeline itself never fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error("preference store: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("fetch failed: {0}")]
    Fetch(String),
}
