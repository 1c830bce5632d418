//! Transparent splice element that records calls before forwarding them.
//!
//! A [`ChannelTap`] sits in the middle of a bidirectional channel. It exposes
//! the same call interfaces as the endpoint it stands in for, hands every
//! transaction to its [`RecordSink`] first, then forwards the call unchanged
//! through its own outbound port. The sink therefore always observes the
//! payload exactly as the caller issued it, and the callee still receives a
//! mutable reference to the very same payload.
//!
//! Two runtime flags shape what gets recorded:
//!
//! - [`TRACING_FLAG`] (`enable_tracing`, default on): when cleared the tap
//!   stops recording but keeps forwarding.
//! - [`TIMED_FLAG`] (`enable_timed`, default off): surfaced to sinks through
//!   [`RecordContext::timed`] so they can switch representation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use patchbay_core::{
    derived_name, BwTransport, ChannelResult, ConfigFlag, FwTransport, Port, Protocol,
};

use crate::extension::ExtensionRecorder;
use crate::sink::{Direction, RecordContext, RecordSink};

/// Attribute key of the flag that enables or disables recording.
pub const TRACING_FLAG: &str = "enable_tracing";

/// Attribute key of the flag that marks recorded calls as timed.
pub const TIMED_FLAG: &str = "enable_timed";

/// Name suffix appended to the host socket's name to form the tap's name.
pub const TAP_SUFFIX: &str = "tap";

/// Recording splice for one bidirectional channel.
///
/// Cloning a `ChannelTap` yields another handle onto the same splice: the
/// ports, flags, and sequence counter are shared. Wrapper sockets rely on
/// this to hand the tap out as a forward interface on one side and a
/// backward interface on the other.
pub struct ChannelTap<P: Protocol> {
    inner: Rc<TapInner<P>>,
}

struct TapInner<P: Protocol> {
    name: String,
    fw_port: Port<dyn FwTransport<P>>,
    bw_port: Port<dyn BwTransport<P>>,
    sink: Rc<dyn RecordSink<P>>,
    extension: RefCell<Option<Rc<dyn ExtensionRecorder<P>>>>,
    enable_tracing: ConfigFlag,
    enable_timed: ConfigFlag,
    seq: Cell<u64>,
}

impl<P: Protocol> ChannelTap<P> {
    /// Create a tap named after its host socket, recording into `sink`.
    ///
    /// The tap is named `<socket_name>_tap` and its outbound ports
    /// `<socket_name>_tap_fw_port` and `<socket_name>_tap_bw_port`. Recording
    /// starts enabled and untimed.
    pub fn new(socket_name: &str, sink: Rc<dyn RecordSink<P>>) -> Self {
        let name = derived_name(socket_name, TAP_SUFFIX);
        let fw_port = Port::new(derived_name(&name, "fw_port"));
        let bw_port = Port::new(derived_name(&name, "bw_port"));
        Self {
            inner: Rc::new(TapInner {
                name,
                fw_port,
                bw_port,
                sink,
                extension: RefCell::new(None),
                enable_tracing: ConfigFlag::new(TRACING_FLAG, true),
                enable_timed: ConfigFlag::new(TIMED_FLAG, false),
                seq: Cell::new(0),
            }),
        }
    }

    /// The tap's hierarchical name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Outbound port carrying forwarded request calls.
    pub fn fw_port(&self) -> Port<dyn FwTransport<P>> {
        self.inner.fw_port.clone()
    }

    /// Outbound port carrying forwarded reply calls.
    pub fn bw_port(&self) -> Port<dyn BwTransport<P>> {
        self.inner.bw_port.clone()
    }

    /// Flag controlling whether calls are recorded at all.
    pub fn tracing_flag(&self) -> ConfigFlag {
        self.inner.enable_tracing.clone()
    }

    /// Flag marking recorded calls as timed.
    pub fn timed_flag(&self) -> ConfigFlag {
        self.inner.enable_timed.clone()
    }

    /// Install or remove the companion extension recorder.
    ///
    /// When installed, the recorder runs once per recorded call, after the
    /// primary sink. Calls skipped because tracing is disabled never reach
    /// it. A recorder may call this from inside its own callback to replace
    /// or remove itself; the swap takes effect on the next recorded call.
    pub fn set_extension_recorder(&self, recorder: Option<Rc<dyn ExtensionRecorder<P>>>) {
        *self.inner.extension.borrow_mut() = recorder;
    }

    /// This tap as a bindable forward interface.
    pub fn as_fw_iface(&self) -> Rc<dyn FwTransport<P>> {
        Rc::new(self.clone())
    }

    /// This tap as a bindable backward interface.
    pub fn as_bw_iface(&self) -> Rc<dyn BwTransport<P>> {
        Rc::new(self.clone())
    }

    fn observe(&self, direction: Direction, txn: &P::Payload) {
        if !self.inner.enable_tracing.get() {
            return;
        }
        let seq = self.inner.seq.get();
        self.inner.seq.set(seq + 1);
        let ctx = RecordContext {
            channel: &self.inner.name,
            seq,
            timed: self.inner.enable_timed.get(),
        };
        self.inner.sink.record(direction, txn, &ctx);
        // Cloned out of the cell before the call so the recorder can swap or
        // remove itself from inside its own callback.
        let extension = self.inner.extension.borrow().clone();
        if let Some(extension) = extension {
            extension.record_extensions(direction, txn, &ctx);
        }
    }
}

impl<P: Protocol> Clone for ChannelTap<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: Protocol> FwTransport<P> for ChannelTap<P> {
    fn fw_transport(
        &self,
        txn: &mut P::Payload,
        phase: &mut P::Phase,
    ) -> ChannelResult<P::Status> {
        self.observe(Direction::Forward, txn);
        tracing::trace!(tap = %self.inner.name, "forwarding request call");
        self.inner.fw_port.get()?.fw_transport(txn, phase)
    }
}

impl<P: Protocol> BwTransport<P> for ChannelTap<P> {
    fn bw_transport(
        &self,
        txn: &mut P::Payload,
        phase: &mut P::Phase,
    ) -> ChannelResult<P::Status> {
        self.observe(Direction::Backward, txn);
        tracing::trace!(tap = %self.inner.name, "forwarding reply call");
        self.inner.bw_port.get()?.bw_transport(txn, phase)
    }
}
