//! In-memory adapters for tests and single-process deployments.

mod account_repository;
mod competition_repository;
mod event_store;
mod session_store;
mod team_repository;

pub use account_repository::InMemoryAccountRepository;
pub use competition_repository::InMemoryCompetitionRepository;
pub use event_store::InMemoryProcessedEventStore;
pub use session_store::InMemorySessionStore;
pub use team_repository::InMemoryTeamRepository;
