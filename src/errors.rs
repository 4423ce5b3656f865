use thiserror::Error;

/// Main error type for the combat engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleEngineError {
    /// Error related to skill/item/enemy lookup
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    /// Error related to invalid session state
    #[error("Battle state error: {0}")]
    BattleState(#[from] BattleStateError),
    /// Error related to a rejected command
    #[error("Action error: {0}")]
    Action(#[from] ActionError),
}

/// Errors related to content resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("Skill not found: {0}")]
    SkillNotFound(String),
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    #[error("Equipment not found: {0}")]
    EquipmentNotFound(String),
    #[error("Enemy template not found: {0}")]
    EnemyNotFound(String),
    #[error("Combatant not found: {0}")]
    ActorNotFound(String),
}

/// Errors related to the session state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleStateError {
    /// The call is not valid in the current phase
    #[error("Expected phase {expected}, session is in {actual}")]
    WrongPhase { expected: String, actual: String },
    #[error("Battle has already ended")]
    BattleEnded,
}

/// Errors related to submitted commands
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{0} cannot act: already defeated")]
    ActorDefeated(String),
    #[error("{0} is stunned")]
    ActorStunned(String),
    #[error("{0} is not a player combatant")]
    NotAPlayer(String),
    #[error("{actor} needs {required} MP but has {available}")]
    InsufficientMp {
        actor: String,
        required: u32,
        available: u32,
    },
    #[error("Item unavailable: {0}")]
    ItemUnavailable(String),
    #[error("Fleeing is not possible in this battle")]
    FleeForbidden,
    #[error("The party already failed to flee this round")]
    FleeAlreadyFailed,
}

/// Errors raised while loading configuration or content files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Type alias for Results using DataError
pub type DataResult<T> = Result<T, DataError>;
