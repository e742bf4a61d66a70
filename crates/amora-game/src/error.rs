//! Game core error type.

use thiserror::Error;

/// Hard failures of the game core. Gating refusals are NOT errors — they
/// come back as refused outcomes with a player-facing reason.
#[derive(Debug, Error)]
pub enum GameError {
    /// A referenced row (story, scene, chapter, choice, user) is missing.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Authoring input that breaks a content invariant.
    #[error("{0}")]
    Invalid(String),

    /// Persistence failure.
    #[error(transparent)]
    Db(#[from] anyhow::Error),

    /// Persistence failure surfaced directly from SQLite.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
