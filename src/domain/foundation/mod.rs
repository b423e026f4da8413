//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the Pitchside domain.

mod errors;
mod ids;
mod outcome;
mod state_machine;
mod timestamp;

pub use errors::CoreError;
pub use ids::{AccountId, CompetitionId, TeamId, UserId};
pub use outcome::FactOutcome;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
