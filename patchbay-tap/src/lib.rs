//! # Patchbay Tap Layer
//!
//! Recording wrapper sockets for the patchbay channel framework.
//!
//! This crate provides:
//! - **ChannelTap**: Transparent splice that records calls before forwarding
//! - **Wrapper sockets**: Drop-in originating and receiving endpoints with a
//!   tap built in
//! - **Record sinks**: In-memory, log-based, and JSON-lines event consumers
//! - **Extension recording**: Optional companion capture of per-transaction
//!   metadata

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// Re-export core types for convenience
pub use patchbay_core::{
    derived_name, unique_name, AttributeSet, BwTransport, ChannelError, ChannelResult,
    ConfigFlag, FwTransport, InitiatorSide, InitiatorSocket, MemBus, MemCmd, MemPayload,
    MemPhase, MemStatus, Port, Protocol, SyncStatus, TargetSide, TargetSocket,
};

// =============================================================================
// Modules
// =============================================================================

/// Companion recording of auxiliary transaction metadata.
pub mod extension;

/// Originating-side wrapper socket.
pub mod initiator;

/// Record sinks and the events they consume.
pub mod sink;

/// The splice element that records and forwards calls.
pub mod tap;

/// Receiving-side wrapper socket.
pub mod target;

// =============================================================================
// Public API Re-exports
// =============================================================================

// Extension exports
pub use extension::ExtensionRecorder;

// Wrapper socket exports
pub use initiator::TapInitiatorSocket;
pub use target::TapTargetSocket;

// Sink exports
pub use sink::{
    Direction, JsonLinesSink, MemorySink, RecordContext, RecordSink, RecordedEvent, TraceSink,
};

// Tap exports
pub use tap::{ChannelTap, TAP_SUFFIX, TIMED_FLAG, TRACING_FLAG};
