use thiserror::Error;

#[derive(Error, Debug)]
pub enum AidatError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown apartment: {0}")]
    UnknownApartment(u32),

    #[error("No data for year {0}")]
    NoArchive(i32),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, AidatError>;
