//! Stripe-backed processor gateway and its test double.

mod gateway;
mod mock_gateway;

pub use gateway::StripeGateway;
pub use mock_gateway::MockProcessorGateway;
