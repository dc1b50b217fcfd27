use thiserror::Error;

/// A recurrence rule that could not be parsed.
///
/// Kept separate from [`CoreError`] so the read-time expansion path can
/// report it without dragging storage errors along.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid recurrence rule '{rule}': {reason}")]
pub struct RuleParseError {
    pub rule: String,
    pub reason: String,
}

impl RuleParseError {
    pub fn new(rule: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            rule: rule.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Serialization error")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    RuleParse(#[from] RuleParseError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
