use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("store error: {0}")]
    Store(#[from] kek_core::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("no media or shareholder {0} in the graph")]
    UnknownEntity(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
