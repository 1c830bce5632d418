//! # patchbay-core
//!
//! Host primitives for patchbay's transaction channels.
//!
//! This crate provides the pieces a channel is wired from:
//!
//! - **Transport contracts**: [`Protocol`], [`FwTransport`], [`BwTransport`]
//! - **Ports**: bind-once connection slots with call-time resolution
//! - **Sockets**: plain originating/receiving endpoints plus the side traits
//!   bind peers implement
//! - **Attributes**: discoverable boolean flags on components
//! - **Naming**: deterministic diagnostic names
//! - **MemBus**: a small memory-bus protocol for examples and tests
//!
//! ## Call model
//!
//! Everything is synchronous call-and-return on one thread: a forward call
//! travels originating side → receiving side, mutates the transaction in
//! place, and carries the callee's status back on the same stack. Backward
//! calls mirror this for the response direction. Wiring is lazy: ports
//! resolve their bindings at call time, so channels can be assembled in any
//! order before the first call.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod attrs;
mod error;
mod mem;
mod naming;
mod port;
mod socket;
mod transport;

// Attribute exports
pub use attrs::{AttributeSet, ConfigFlag};

// Error exports
pub use error::{ChannelError, ChannelResult};

// Example protocol exports
pub use mem::{MemBus, MemCmd, MemPayload, MemPhase, MemStatus};

// Naming exports
pub use naming::{derived_name, unique_name};

// Port exports
pub use port::Port;

// Socket exports
pub use socket::{InitiatorSide, InitiatorSocket, TargetSide, TargetSocket};

// Transport contract exports
pub use transport::{BwTransport, FwTransport, Protocol, SyncStatus};
