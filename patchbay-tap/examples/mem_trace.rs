//! Memory Trace Example: a CPU talking to a RAM through tapped sockets.
//!
//! This example splices recording taps into both ends of a memory channel
//! and shows every transaction being captured without the endpoints
//! noticing.
//!
//! ```bash
//! cargo run --example mem_trace
//! ```
//!
//! # Architecture
//!
//! The example shows:
//! - `TapInitiatorSocket` / `TapTargetSocket` as drop-in endpoints
//! - `JsonLinesSink` streaming the CPU-side trace to stdout
//! - `TraceSink` feeding the RAM-side trace into `tracing`
//! - Runtime flags pausing and resuming recording mid-run

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use patchbay_tap::{
    BwTransport, ChannelResult, FwTransport, JsonLinesSink, MemBus, MemCmd, MemPayload, MemPhase,
    MemStatus, SyncStatus, TapInitiatorSocket, TapTargetSocket, TraceSink,
};

// ============================================================================
// Configuration
// ============================================================================

const RAM_SIZE: usize = 256;

// ============================================================================
// RAM Owner - serves reads and writes against a byte array
// ============================================================================

struct RamOwner {
    cells: RefCell<Vec<u8>>,
}

impl RamOwner {
    fn new(size: usize) -> Rc<Self> {
        Rc::new(Self {
            cells: RefCell::new(vec![0; size]),
        })
    }
}

impl FwTransport<MemBus> for RamOwner {
    fn fw_transport(
        &self,
        txn: &mut MemPayload,
        _phase: &mut MemPhase,
    ) -> ChannelResult<SyncStatus> {
        let mut cells = self.cells.borrow_mut();
        let start = usize::try_from(txn.addr).unwrap_or(usize::MAX);
        // Wrapping cursor arithmetic is an address error, not a panic
        let end = match start.checked_add(txn.len as usize) {
            Some(end) if end <= cells.len() => end,
            _ => {
                txn.status = MemStatus::AddressError;
                return Ok(SyncStatus::Completed);
            }
        };

        match txn.cmd {
            MemCmd::Read => txn.data = cells[start..end].to_vec(),
            MemCmd::Write => cells[start..end].copy_from_slice(&txn.data),
        }
        txn.status = MemStatus::Ok;
        Ok(SyncStatus::Completed)
    }
}

// ============================================================================
// CPU Reply Handler - receives RAM-initiated notifications
// ============================================================================

struct CpuReplies;

impl BwTransport<MemBus> for CpuReplies {
    fn bw_transport(
        &self,
        txn: &mut MemPayload,
        _phase: &mut MemPhase,
    ) -> ChannelResult<SyncStatus> {
        println!("cpu <- notification for 0x{:x}: {:?}", txn.addr, txn.status);
        Ok(SyncStatus::Accepted)
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    println!("=== Memory Trace Example ===\n");

    // CPU side streams its trace as JSON lines; RAM side logs via tracing
    let cpu = TapInitiatorSocket::<MemBus>::with_name(
        "cpu",
        Rc::new(JsonLinesSink::new(io::stdout())),
    );
    let ram = TapTargetSocket::<MemBus>::with_name("ram", Rc::new(TraceSink::new()));

    cpu.bind(&ram).expect("binding cpu to ram should succeed");
    ram.bind_forward(RamOwner::new(RAM_SIZE))
        .expect("attaching the RAM model should succeed");
    cpu.bind_backward(Rc::new(CpuReplies))
        .expect("attaching the CPU reply handler should succeed");

    // Write four bytes, then read them back
    let mut phase = MemPhase::Request;
    let mut write = MemPayload::write(0x40, vec![0xca, 0xfe, 0xba, 0xbe]);
    cpu.fw_transport(&mut write, &mut phase)
        .expect("write should be delivered");
    println!("cpu -> write 0x40: {:?}\n", write.status);

    let mut read = MemPayload::read(0x40, 4);
    cpu.fw_transport(&mut read, &mut phase)
        .expect("read should be delivered");
    println!("cpu -> read 0x40: {:02x?} ({:?})\n", read.data, read.status);

    // RAM raises a notification on the backward path
    let mut phase = MemPhase::Response;
    let mut note = MemPayload::read(0x40, 4);
    note.status = MemStatus::Ok;
    ram.bw_transport(&mut note, &mut phase)
        .expect("notification should be delivered");

    // Pause CPU-side recording; the read still goes through, untraced
    println!("\npausing cpu-side recording");
    cpu.tracing_flag().set(false);
    let mut phase = MemPhase::Request;
    let mut quiet = MemPayload::read(0x40, 2);
    cpu.fw_transport(&mut quiet, &mut phase)
        .expect("untraced read should be delivered");
    println!("cpu -> read 0x40 (untraced): {:02x?}\n", quiet.data);
    cpu.tracing_flag().set(true);

    // Out-of-range access surfaces as a payload status, not a channel error
    let mut bad = MemPayload::read(0x1_0000, 4);
    cpu.fw_transport(&mut bad, &mut phase)
        .expect("out-of-range read is still delivered");
    println!("cpu -> read 0x10000: {:?}", bad.status);
    assert_eq!(bad.status, MemStatus::AddressError);

    // Same for an address at the top of the space
    let mut wild = MemPayload::read(u64::MAX, 4);
    cpu.fw_transport(&mut wild, &mut phase)
        .expect("wrapping read is still delivered");
    println!("cpu -> read 0x{:x}: {:?}", wild.addr, wild.status);
    assert_eq!(wild.status, MemStatus::AddressError);
}
