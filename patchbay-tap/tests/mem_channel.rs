//! Integration tests for a single tapped channel between two endpoints.
//!
//! These tests exercise the leaf-binding topology:
//! - A wrapper initiator bound to a wrapper target
//! - Transactions delivered exactly once, mutations visible to the caller
//! - One recorded event per wrapper per call, holding the payload as sent
//! - Runtime flags and the extension recorder

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use patchbay_tap::{
    BwTransport, ChannelError, ChannelResult, Direction, ExtensionRecorder, FwTransport,
    InitiatorSocket, MemBus, MemCmd, MemPayload, MemPhase, MemStatus, MemorySink, RecordContext,
    SyncStatus, TapInitiatorSocket, TapTargetSocket, TargetSocket,
};

/// Receiving-side owner: captures every request, serves reads, acknowledges.
struct MemTargetOwner {
    seen: RefCell<Vec<MemPayload>>,
    read_data: Vec<u8>,
}

impl MemTargetOwner {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            seen: RefCell::new(Vec::new()),
            read_data: vec![1, 2, 3, 4],
        })
    }
}

impl FwTransport<MemBus> for MemTargetOwner {
    fn fw_transport(
        &self,
        txn: &mut MemPayload,
        _phase: &mut MemPhase,
    ) -> ChannelResult<SyncStatus> {
        self.seen.borrow_mut().push(txn.clone());
        if txn.cmd == MemCmd::Read {
            txn.data = self.read_data[..txn.len as usize].to_vec();
        }
        txn.status = MemStatus::Ok;
        Ok(SyncStatus::Completed)
    }
}

/// Originating-side owner: captures every reply it is handed.
struct MemInitiatorOwner {
    seen: RefCell<Vec<MemPayload>>,
}

impl MemInitiatorOwner {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            seen: RefCell::new(Vec::new()),
        })
    }
}

impl BwTransport<MemBus> for MemInitiatorOwner {
    fn bw_transport(
        &self,
        txn: &mut MemPayload,
        _phase: &mut MemPhase,
    ) -> ChannelResult<SyncStatus> {
        self.seen.borrow_mut().push(txn.clone());
        Ok(SyncStatus::Accepted)
    }
}

/// Originating-side owner that consumes the data out of every reply.
struct DrainingInitiatorOwner;

impl BwTransport<MemBus> for DrainingInitiatorOwner {
    fn bw_transport(
        &self,
        txn: &mut MemPayload,
        _phase: &mut MemPhase,
    ) -> ChannelResult<SyncStatus> {
        txn.data.clear();
        Ok(SyncStatus::Accepted)
    }
}

struct CountingExtension {
    calls: Cell<u32>,
}

impl ExtensionRecorder<MemBus> for CountingExtension {
    fn record_extensions(
        &self,
        _direction: Direction,
        _txn: &MemPayload,
        _ctx: &RecordContext<'_>,
    ) {
        self.calls.set(self.calls.get() + 1);
    }
}

/// Fully wired tapped channel: `cpu` (initiator wrapper) to `ram` (target
/// wrapper), with owner doubles attached on both ends.
struct Channel {
    cpu: TapInitiatorSocket<MemBus>,
    ram: TapTargetSocket<MemBus>,
    cpu_events: MemorySink<MemBus>,
    ram_events: MemorySink<MemBus>,
    ram_owner: Rc<MemTargetOwner>,
    cpu_owner: Rc<MemInitiatorOwner>,
}

fn wired_channel() -> Channel {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let cpu_events = MemorySink::new();
    let ram_events = MemorySink::new();
    let cpu = TapInitiatorSocket::<MemBus>::with_name("cpu", Rc::new(cpu_events.clone()));
    let ram = TapTargetSocket::<MemBus>::with_name("ram", Rc::new(ram_events.clone()));
    let ram_owner = MemTargetOwner::new();
    let cpu_owner = MemInitiatorOwner::new();

    cpu.bind(&ram).expect("bind should succeed");
    ram.bind_forward(ram_owner.clone())
        .expect("attaching the target owner should succeed");
    cpu.bind_backward(cpu_owner.clone())
        .expect("attaching the initiator owner should succeed");

    Channel {
        cpu,
        ram,
        cpu_events,
        ram_events,
        ram_owner,
        cpu_owner,
    }
}

/// Test a write request crossing the tapped channel end to end.
#[test]
fn test_forward_write_delivered_once_and_recorded_per_wrapper() {
    let ch = wired_channel();

    let mut txn = MemPayload::write(0x1000, vec![0xde, 0xad, 0xbe, 0xef]);
    let mut phase = MemPhase::Request;
    let status = ch
        .cpu
        .fw_transport(&mut txn, &mut phase)
        .expect("forward call should succeed");

    // Delivered exactly once, acknowledged by the owner
    assert_eq!(status, SyncStatus::Completed);
    assert_eq!(txn.status, MemStatus::Ok);
    assert_eq!(ch.ram_owner.seen.borrow().len(), 1);

    // Each wrapper recorded the call once, with the payload as sent
    for events in [&ch.cpu_events, &ch.ram_events] {
        assert_eq!(events.count(Direction::Forward), 1);
        assert_eq!(events.count(Direction::Backward), 0);
        let recorded = &events.events()[0];
        assert_eq!(recorded.payload.addr, 0x1000);
        assert_eq!(recorded.payload.data, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(recorded.payload.status, MemStatus::Incomplete);
    }
    assert_eq!(ch.cpu_events.events()[0].channel, "cpu_tap");
    assert_eq!(ch.ram_events.events()[0].channel, "ram_tap");
}

/// Test a reply crossing the channel backward.
#[test]
fn test_backward_reply_delivered_once_and_recorded_per_wrapper() {
    let ch = wired_channel();

    let mut reply = MemPayload::read(0x1000, 4);
    reply.status = MemStatus::Ok;
    let sent = reply.clone();
    let mut phase = MemPhase::Response;
    let status = ch
        .ram
        .bw_transport(&mut reply, &mut phase)
        .expect("backward call should succeed");

    // Delivered exactly once, exactly as issued
    assert_eq!(status, SyncStatus::Accepted);
    assert_eq!(ch.cpu_owner.seen.borrow().len(), 1);
    assert_eq!(ch.cpu_owner.seen.borrow()[0], sent);

    // Each wrapper recorded the reply once, with the payload as sent
    for events in [&ch.cpu_events, &ch.ram_events] {
        assert_eq!(events.count(Direction::Backward), 1);
        assert_eq!(events.count(Direction::Forward), 0);
        assert_eq!(events.events()[0].payload, sent);
    }
}

/// Test that handler mutations of the payload reach the caller unchanged.
#[test]
fn test_read_data_filled_by_the_handler_reaches_the_caller() {
    let ch = wired_channel();

    let mut txn = MemPayload::read(0x2000, 4);
    let mut phase = MemPhase::Request;
    ch.cpu
        .fw_transport(&mut txn, &mut phase)
        .expect("read should succeed");

    assert_eq!(txn.data, vec![1, 2, 3, 4]);
    assert_eq!(txn.status, MemStatus::Ok);
}

/// Test that owner mutations of the reply reach the issuing side.
#[test]
fn test_reply_data_drained_by_the_owner_reaches_the_issuer() {
    let cpu = TapInitiatorSocket::<MemBus>::with_name("cpu", Rc::new(MemorySink::new()));
    let ram = TapTargetSocket::<MemBus>::with_name("ram", Rc::new(MemorySink::new()));
    cpu.bind(&ram).expect("bind should succeed");
    cpu.bind_backward(Rc::new(DrainingInitiatorOwner))
        .expect("attaching the initiator owner should succeed");

    let mut reply = MemPayload::read(0x2000, 4);
    reply.data = vec![1, 2, 3, 4];
    reply.status = MemStatus::Ok;
    let mut phase = MemPhase::Response;
    ram.bw_transport(&mut reply, &mut phase)
        .expect("backward call should succeed");

    assert!(reply.data.is_empty());
    assert_eq!(reply.status, MemStatus::Ok);
}

/// Test that clearing the tracing flag stops recording without touching
/// delivery.
#[test]
fn test_tracing_flag_gates_recording_but_not_forwarding() {
    let ch = wired_channel();
    ch.cpu.tracing_flag().set(false);

    let mut txn = MemPayload::write(0x10, vec![1]);
    let mut phase = MemPhase::Request;
    ch.cpu
        .fw_transport(&mut txn, &mut phase)
        .expect("forward call should succeed");

    assert!(ch.cpu_events.is_empty());
    assert_eq!(ch.ram_events.count(Direction::Forward), 1);
    assert_eq!(ch.ram_owner.seen.borrow().len(), 1);
}

/// Test that the timed flag is surfaced through the record context.
#[test]
fn test_timed_flag_appears_in_recorded_events() {
    let ch = wired_channel();
    ch.ram.timed_flag().set(true);

    let mut txn = MemPayload::write(0x10, vec![1]);
    let mut phase = MemPhase::Request;
    ch.cpu
        .fw_transport(&mut txn, &mut phase)
        .expect("forward call should succeed");

    assert!(ch.ram_events.events()[0].timed);
    assert!(!ch.cpu_events.events()[0].timed);
}

/// Test that an installed extension recorder runs once per recorded call
/// and not for calls recording skips.
#[test]
fn test_extension_recorder_follows_the_tracing_flag() {
    let ch = wired_channel();
    let ext = Rc::new(CountingExtension {
        calls: Cell::new(0),
    });
    ch.cpu.set_extension_recorder(Some(ext.clone()));

    let mut txn = MemPayload::write(0x10, vec![1]);
    let mut phase = MemPhase::Request;
    ch.cpu
        .fw_transport(&mut txn, &mut phase)
        .expect("first call should succeed");
    ch.cpu
        .fw_transport(&mut txn, &mut phase)
        .expect("second call should succeed");

    ch.cpu.tracing_flag().set(false);
    ch.cpu
        .fw_transport(&mut txn, &mut phase)
        .expect("unrecorded call should still be delivered");

    assert_eq!(ext.calls.get(), 2);
    assert_eq!(ch.cpu_events.count(Direction::Forward), 2);
}

/// Test that a plain initiator can bind a wrapper target; only the wrapped
/// side records.
#[test]
fn test_plain_initiator_against_wrapper_target() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let ram_events = MemorySink::new();
    let m = InitiatorSocket::<MemBus>::new("m");
    let ram = TapTargetSocket::<MemBus>::with_name("ram", Rc::new(ram_events.clone()));
    let ram_owner = MemTargetOwner::new();
    let cpu_owner = MemInitiatorOwner::new();

    m.bind(&ram).expect("bind should succeed");
    ram.bind_forward(ram_owner.clone())
        .expect("attaching the target owner should succeed");
    m.bind_backward(cpu_owner.clone())
        .expect("attaching the initiator owner should succeed");

    let mut txn = MemPayload::read(0x40, 2);
    let mut phase = MemPhase::Request;
    m.fw_transport(&mut txn, &mut phase)
        .expect("forward call should succeed");

    let mut reply = MemPayload::read(0x40, 2);
    let mut phase = MemPhase::Response;
    ram.bw_transport(&mut reply, &mut phase)
        .expect("backward call should succeed");

    assert_eq!(ram_owner.seen.borrow().len(), 1);
    assert_eq!(cpu_owner.seen.borrow().len(), 1);
    assert_eq!(ram_events.count(Direction::Forward), 1);
    assert_eq!(ram_events.count(Direction::Backward), 1);
}

/// Test that a wrapper initiator can bind a plain target; only the wrapped
/// side records.
#[test]
fn test_wrapper_initiator_against_plain_target() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let cpu_events = MemorySink::new();
    let cpu = TapInitiatorSocket::<MemBus>::with_name("cpu", Rc::new(cpu_events.clone()));
    let s = TargetSocket::<MemBus>::new("s");
    let ram_owner = MemTargetOwner::new();
    let cpu_owner = MemInitiatorOwner::new();

    cpu.bind(&s).expect("bind should succeed");
    s.bind_forward(ram_owner.clone())
        .expect("attaching the target owner should succeed");
    cpu.bind_backward(cpu_owner.clone())
        .expect("attaching the initiator owner should succeed");

    let mut txn = MemPayload::write(0x80, vec![9]);
    let mut phase = MemPhase::Request;
    cpu.fw_transport(&mut txn, &mut phase)
        .expect("forward call should succeed");

    let mut reply = MemPayload::read(0x80, 1);
    let mut phase = MemPhase::Response;
    s.bw_transport(&mut reply, &mut phase)
        .expect("backward call should succeed");

    assert_eq!(ram_owner.seen.borrow().len(), 1);
    assert_eq!(cpu_owner.seen.borrow().len(), 1);
    assert_eq!(cpu_events.count(Direction::Forward), 1);
    assert_eq!(cpu_events.count(Direction::Backward), 1);
}

/// Test that each connection slot accepts exactly one binding.
#[test]
fn test_rebinding_a_connected_channel_is_rejected() {
    let cpu = TapInitiatorSocket::<MemBus>::with_name("cpu", Rc::new(MemorySink::new()));
    let ram = TapTargetSocket::<MemBus>::with_name("ram", Rc::new(MemorySink::new()));
    let ram2 = TapTargetSocket::<MemBus>::with_name("ram2", Rc::new(MemorySink::new()));
    let m2 = InitiatorSocket::<MemBus>::new("m2");

    cpu.bind(&ram).expect("first bind should succeed");

    let err = cpu.bind(&ram2).expect_err("rebinding the initiator must fail");
    assert!(matches!(err, ChannelError::AlreadyBound { .. }));

    let err = m2.bind(&ram).expect_err("rebinding the target must fail");
    assert!(matches!(err, ChannelError::AlreadyBound { .. }));
}

/// Test that calling through an unbound wrapper reports the dangling port.
#[test]
fn test_unbound_forward_call_reports_the_dangling_port() {
    let cpu = TapInitiatorSocket::<MemBus>::with_name("cpu", Rc::new(MemorySink::new()));

    let mut txn = MemPayload::read(0, 1);
    let mut phase = MemPhase::Request;
    let err = cpu
        .fw_transport(&mut txn, &mut phase)
        .expect_err("unbound call must fail");

    assert!(matches!(err, ChannelError::Unbound { port } if port == "cpu_fw_port"));
}
