//! Services - alert decision logic
//!
//! This module contains the core services:
//! - `handler` - Transition event handler (validation, message, channel fan-out)
//! - `worker` - Async worker feeding inbound events to the handler

pub mod handler;
pub mod worker;

// Re-export commonly used types
pub use handler::{
    AlertChannels, ChannelOutcome, DiscardReason, DispatchReport, Disposition, TransitionHandler,
};
pub use worker::{create_transition_worker, TransitionWorker};
