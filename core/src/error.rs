use thiserror::Error;

use crate::{ElementCount, Phase};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("element count {0} outside the playable 3..=7 range")]
    InvalidElementCount(ElementCount),
    #[error("operation not valid in phase {0:?}")]
    PhaseViolation(Phase),
}

pub type Result<T> = core::result::Result<T, GameError>;
