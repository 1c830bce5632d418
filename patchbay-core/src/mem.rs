//! A small memory-bus protocol for examples and tests.
//!
//! Transactions model read/write commands against a flat byte-addressed
//! space. The originating side fills the command half of the payload; the
//! receiving side fills `data` (for reads) and `status`.

use serde::{Deserialize, Serialize};

use crate::transport::{Protocol, SyncStatus};

/// Marker type wiring the memory-bus types into [`Protocol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemBus;

impl Protocol for MemBus {
    type Payload = MemPayload;
    type Phase = MemPhase;
    type Status = SyncStatus;
}

/// Command carried by a memory-bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemCmd {
    /// Read `len` bytes starting at `addr`.
    Read,
    /// Write the payload data starting at `addr`.
    Write,
}

/// Completion status of a memory-bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemStatus {
    /// Not yet completed by a receiving endpoint.
    Incomplete,
    /// Completed successfully.
    Ok,
    /// Address out of range.
    AddressError,
    /// Command not supported by the receiving endpoint.
    CommandError,
    /// Any other failure.
    GenericError,
}

/// Call phase of a memory-bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemPhase {
    /// Request travelling forward.
    Request,
    /// Response travelling backward.
    Response,
}

/// A memory-bus transaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemPayload {
    /// Command kind.
    pub cmd: MemCmd,
    /// Start address.
    pub addr: u64,
    /// Transfer length in bytes.
    pub len: u32,
    /// Data buffer: write data on the forward path, read data filled by the
    /// receiving endpoint.
    pub data: Vec<u8>,
    /// Completion status, filled by the receiving endpoint.
    pub status: MemStatus,
}

impl MemPayload {
    /// A read request for `len` bytes at `addr`.
    pub fn read(addr: u64, len: u32) -> Self {
        Self {
            cmd: MemCmd::Read,
            addr,
            len,
            data: Vec::new(),
            status: MemStatus::Incomplete,
        }
    }

    /// A write request carrying `data` at `addr`.
    ///
    /// `len` mirrors `data.len()`, saturating at `u32::MAX` for buffers too
    /// long to describe.
    pub fn write(addr: u64, data: Vec<u8>) -> Self {
        let len = u32::try_from(data.len()).unwrap_or(u32::MAX);
        Self {
            cmd: MemCmd::Write,
            addr,
            len,
            data,
            status: MemStatus::Incomplete,
        }
    }

    /// Whether the receiving endpoint reported success.
    pub fn is_ok(&self) -> bool {
        self.status == MemStatus::Ok
    }
}
