//! Recording contracts and the provided record sinks.
//!
//! A [`ChannelTap`](crate::ChannelTap) hands every observed call to a
//! [`RecordSink`] before forwarding it. Sinks must never fail the channel:
//! `record` returns `()`, and sinks that can fail internally (I/O,
//! serialization) log and continue.
//!
//! Three sinks are provided:
//!
//! - [`MemorySink`]: shared in-memory buffer, the test workhorse
//! - [`TraceSink`]: structured `tracing` events
//! - [`JsonLinesSink`]: one JSON object per line to any writer

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::io::{self, Write};
use std::rc::Rc;

use patchbay_core::Protocol;
use serde::{Deserialize, Serialize};

/// Direction of an observed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Request direction: originating endpoint toward receiving endpoint.
    Forward,
    /// Response direction: receiving endpoint toward originating endpoint.
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Per-event context handed to sinks alongside the payload.
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    /// Name of the tap that observed the call.
    pub channel: &'a str,
    /// Event sequence number within that tap's stream, starting at 0.
    pub seq: u64,
    /// Whether timed recording was requested (the `enable_timed` flag).
    pub timed: bool,
}

/// Consumer of observed calls.
///
/// Invoked once per observed call, after the tap decided to record and
/// before the call is forwarded. Implementations own their failures: a
/// broken sink logs and continues, it never fails the channel.
pub trait RecordSink<P: Protocol> {
    /// Record one observed call.
    fn record(&self, direction: Direction, txn: &P::Payload, ctx: &RecordContext<'_>);
}

/// One event captured by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent<T> {
    /// Direction of the observed call.
    pub direction: Direction,
    /// Payload as recorded, in the state the tap saw before forwarding.
    pub payload: T,
    /// Name of the recording tap.
    pub channel: String,
    /// Sequence number within that tap's stream.
    pub seq: u64,
    /// Whether timed recording was requested.
    pub timed: bool,
}

/// In-memory sink capturing every event into a shared buffer.
///
/// Cloning yields another handle to the same buffer, so a test can keep one
/// handle and give the other to a tap.
pub struct MemorySink<P: Protocol> {
    events: Rc<RefCell<Vec<RecordedEvent<P::Payload>>>>,
}

impl<P: Protocol> MemorySink<P> {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self {
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Number of captured events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Whether nothing was captured yet.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Number of captured events in one direction.
    pub fn count(&self, direction: Direction) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.direction == direction)
            .count()
    }

    /// Drop all captured events.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl<P: Protocol> MemorySink<P>
where
    P::Payload: Clone,
{
    /// Snapshot of all captured events, oldest first.
    pub fn events(&self) -> Vec<RecordedEvent<P::Payload>> {
        self.events.borrow().clone()
    }

    /// Snapshot filtered to one direction.
    pub fn events_in(&self, direction: Direction) -> Vec<RecordedEvent<P::Payload>> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.direction == direction)
            .cloned()
            .collect()
    }
}

impl<P: Protocol> Default for MemorySink<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Protocol> Clone for MemorySink<P> {
    fn clone(&self) -> Self {
        Self {
            events: Rc::clone(&self.events),
        }
    }
}

impl<P: Protocol> RecordSink<P> for MemorySink<P>
where
    P::Payload: Clone,
{
    fn record(&self, direction: Direction, txn: &P::Payload, ctx: &RecordContext<'_>) {
        self.events.borrow_mut().push(RecordedEvent {
            direction,
            payload: txn.clone(),
            channel: ctx.channel.to_string(),
            seq: ctx.seq,
            timed: ctx.timed,
        });
    }
}

/// Sink emitting one structured `tracing` event per observed call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceSink;

impl TraceSink {
    /// Create the sink.
    pub fn new() -> Self {
        Self
    }
}

impl<P: Protocol> RecordSink<P> for TraceSink
where
    P::Payload: Debug,
{
    fn record(&self, direction: Direction, txn: &P::Payload, ctx: &RecordContext<'_>) {
        tracing::debug!(
            channel = %ctx.channel,
            seq = ctx.seq,
            direction = %direction,
            timed = ctx.timed,
            txn = ?txn,
            "recorded transaction"
        );
    }
}

#[derive(Serialize)]
struct JsonEvent<'a, T: Serialize> {
    channel: &'a str,
    seq: u64,
    direction: Direction,
    timed: bool,
    txn: &'a T,
}

/// Sink writing one JSON object per line to any writer.
///
/// Serialize and write failures are logged with `tracing::warn!` and never
/// propagated: a broken sink must not fail the channel.
pub struct JsonLinesSink<W: Write> {
    writer: RefCell<W>,
}

impl<W: Write> JsonLinesSink<W> {
    /// Create a sink over a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: RefCell::new(writer),
        }
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<P: Protocol, W: Write> RecordSink<P> for JsonLinesSink<W>
where
    P::Payload: Serialize,
{
    fn record(&self, direction: Direction, txn: &P::Payload, ctx: &RecordContext<'_>) {
        let event = JsonEvent {
            channel: ctx.channel,
            seq: ctx.seq,
            direction,
            timed: ctx.timed,
            txn,
        };
        let mut writer = self.writer.borrow_mut();
        let written = serde_json::to_writer(&mut *writer, &event)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(&mut *writer));
        if let Err(e) = written {
            tracing::warn!(channel = %ctx.channel, error = %e, "json sink write failed");
        }
    }
}
