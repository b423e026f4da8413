//! Ports: the traits adapters implement and domain services depend on.

mod account_repository;
mod clock;
mod competition_repository;
mod processed_event_store;
mod processor_gateway;
mod session_store;
mod team_repository;

pub use account_repository::AccountRepository;
pub use clock::{Clock, SystemClock};
pub use competition_repository::CompetitionRepository;
pub use processed_event_store::{ProcessedEventRecord, ProcessedEventStore, SaveResult};
pub use processor_gateway::{
    AccountSnapshot, CheckoutRequest, IssuedSession, ProcessorError, ProcessorGateway,
};
pub use session_store::SessionStore;
pub use team_repository::TeamRepository;
