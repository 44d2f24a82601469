use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("Pedigree error: {0}")]
    Pedigree(String),

    #[error("Unknown parent '{parent}' referenced by '{person}'")]
    UnknownParent { person: String, parent: String },

    #[error("Contradictory evidence: no scenario is consistent with the observed traits")]
    ContradictoryEvidence,

    #[error("Pedigree has {got} people; exhaustive enumeration is capped at {max}")]
    TooLarge { got: usize, max: usize },

    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid move ({row}, {col}): {reason}")]
    InvalidMove { row: usize, col: usize, reason: String },

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, AiError>;
