use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PlanError {
    /// The parent chain led back to a node already visited in this walk.
    #[error("cycle detected in node ancestry at {0}")]
    CycleDetected(Uuid),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PlanError>;
