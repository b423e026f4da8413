//! Pitchside - Youth-sports competition management backend.
//!
//! This crate implements the payment-state reconciliation and
//! eligibility-gating core: it keeps the external payment processor, the
//! backend record, and the client cache consistent, and gates irreversible
//! business transitions (publish, register, roster edits) on that state.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
