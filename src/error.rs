use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Operation failure surfaced to the caller.
///
/// The first four variants are machine-distinguishable so the transport layer
/// can branch on them: `Unauthorized` ("you may not do this"), `NotFound`
/// ("that doesn't exist"), `InvalidState` ("this cannot be done right now")
/// and `Validation` ("the input is malformed"). Nothing is retried here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
