//! Protocol message types.
//!
//! This module defines the message format for communication between the
//! local end (this crate) and the remote end (the browser).
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command request |
//! | `Response` | Remote → Local | Command response |
//! | `Event` | Remote → Local | Browser notification |
//!
//! # Command Naming
//!
//! Commands and events follow `Domain.methodName` format:
//!
//! - `Page.navigate`
//! - `Runtime.callFunctionOn`
//! - `Page.lifecycleEvent`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command definitions by domain |
//! | `event` | Event types and payloads |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by domain.
pub mod command;

/// Event message types.
pub mod event;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{CallArgument, Command, DomCommand, PageCommand, RuntimeCommand};
pub use event::{
    ContextAuxData, ContextPayload, DetachReason, Event, FramePayload, FrameTreePayload,
    ParsedEvent, ResponsePayload,
};
pub use request::{Request, Response, ResponseType};
