//! Game engine - core FSM and room rules.
//!
//! This module provides the foundational game implementation including:
//! - The session state machine driving one room's lifecycle
//! - Sequence generation from a fixed move alphabet
//! - Answer verification and the elimination policy
//! - Event generation for the messaging gateway

pub mod entities;
pub mod sequence;
pub mod session;
pub mod verifier;

pub use session::{GameError, Phase, Session, SessionEvent};
