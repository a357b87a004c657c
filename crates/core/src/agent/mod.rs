//! Agent module for the reasoning backend
//!
//! This module provides the advisory chat call made at the start of each run.

mod reasoning_client;

pub use reasoning_client::{
    HttpReasoningClient, ReasoningBackend, ReasoningConfig, ReasoningReply, ReasoningRequest,
    DEFAULT_ACKNOWLEDGEMENT, DEFAULT_REASONING_TIMEOUT,
};
