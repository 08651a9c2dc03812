//! Error taxonomy for the match core.
//!
//! Variants split into three policy classes: pre-start validation
//! ([`GameError::InsufficientPlayers`]), fatal invariant violations
//! ([`GameError::RoleCountMismatch`], [`GameError::NoEligibleTargets`],
//! [`GameError::PhaseOrder`], [`GameError::RoleAlreadyAssigned`]), and
//! rejected state transitions that leave state untouched
//! ([`GameError::UnknownParticipant`], [`GameError::AlreadyDead`]).
//! Collaborator output malformations are not errors; they are recovered
//! locally with deterministic fallbacks.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("need at least {required} players, got {got}")]
    InsufficientPlayers { required: usize, got: usize },

    #[error("role count mismatch: {roles} roles for {participants} participants")]
    RoleCountMismatch { roles: usize, participants: usize },

    #[error("unknown participant '{0}'")]
    UnknownParticipant(String),

    #[error("participant '{0}' is already dead")]
    AlreadyDead(String),

    #[error("role already assigned for '{0}'")]
    RoleAlreadyAssigned(String),

    #[error("no eligible targets to resolve a vote against")]
    NoEligibleTargets,

    #[error("phase out of order: {0}")]
    PhaseOrder(&'static str),
}
