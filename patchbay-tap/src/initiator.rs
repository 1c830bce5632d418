//! Originating-side wrapper socket with a built-in recording tap.
//!
//! [`TapInitiatorSocket`] is a drop-in replacement for a plain
//! [`InitiatorSocket`]: the owner binds it and issues calls exactly as
//! before. Binding splices the wrapper's [`ChannelTap`] into both call
//! directions, so every request leaving the socket and every reply entering
//! it is recorded before it is forwarded.
//!
//! The wrapper implements [`InitiatorSide`], which makes it usable anywhere
//! a plain originating endpoint is expected, including as the outer link of
//! a hierarchical chain.

use std::rc::Rc;

use patchbay_core::{
    unique_name, AttributeSet, BwTransport, ChannelResult, ConfigFlag, FwTransport,
    InitiatorSide, InitiatorSocket, Port, Protocol, TargetSide,
};

use crate::extension::ExtensionRecorder;
use crate::sink::RecordSink;
use crate::tap::ChannelTap;

const NAME_BASE: &str = "tap_initiator_socket";

/// Originating endpoint that records all traffic crossing it.
pub struct TapInitiatorSocket<P: Protocol> {
    socket: InitiatorSocket<P>,
    tap: ChannelTap<P>,
    attributes: AttributeSet,
}

impl<P: Protocol> TapInitiatorSocket<P> {
    /// Create an auto-named wrapper recording into `sink`.
    ///
    /// The socket is named `tap_initiator_socket_<n>` and both tap flags are
    /// registered on [`attributes`](Self::attributes) so external tooling can
    /// flip them by name.
    pub fn new(sink: Rc<dyn RecordSink<P>>) -> Self {
        let wrapper = Self::with_name(unique_name(NAME_BASE), sink);
        wrapper.attributes.register(wrapper.tap.tracing_flag());
        wrapper.attributes.register(wrapper.tap.timed_flag());
        wrapper
    }

    /// Create a wrapper with an explicit name, recording into `sink`.
    ///
    /// Unlike [`new`](Self::new), no flags are registered on the attribute
    /// set; callers reach them through [`tracing_flag`](Self::tracing_flag)
    /// and [`timed_flag`](Self::timed_flag) instead.
    pub fn with_name(name: impl Into<String>, sink: Rc<dyn RecordSink<P>>) -> Self {
        let socket = InitiatorSocket::new(name);
        let tap = ChannelTap::new(socket.name(), sink);
        tracing::debug!(socket = %socket.name(), tap = %tap.name(), "created tap initiator socket");
        Self {
            socket,
            tap,
            attributes: AttributeSet::new(),
        }
    }

    /// Socket name.
    pub fn name(&self) -> &str {
        self.socket.name()
    }

    /// Runtime attributes registered on this socket.
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Flag controlling whether the tap records at all.
    pub fn tracing_flag(&self) -> ConfigFlag {
        self.tap.tracing_flag()
    }

    /// Flag marking recorded calls as timed.
    pub fn timed_flag(&self) -> ConfigFlag {
        self.tap.timed_flag()
    }

    /// Install or remove the companion extension recorder on the tap.
    pub fn set_extension_recorder(&self, recorder: Option<Rc<dyn ExtensionRecorder<P>>>) {
        self.tap.set_extension_recorder(recorder);
    }

    /// Connect to a receiving-side peer (leaf binding), splicing the tap
    /// into both directions.
    ///
    /// # Errors
    ///
    /// Propagates [`ChannelError::AlreadyBound`](patchbay_core::ChannelError)
    /// when any slot along the splice is already connected.
    pub fn bind(&self, peer: &dyn TargetSide<P>) -> ChannelResult<()> {
        tracing::debug!(socket = %self.name(), peer = %peer.name(), "binding tap initiator to target");
        self.splice()?;
        self.tap.fw_port().bind(peer.fw_iface())?;
        peer.bw_port().bind(self.tap.as_bw_iface())?;
        Ok(())
    }

    /// Chain into an enclosing originating-side endpoint (hierarchical
    /// binding), splicing the tap into both directions.
    ///
    /// # Errors
    ///
    /// Propagates [`ChannelError::AlreadyBound`](patchbay_core::ChannelError)
    /// when any slot along the splice is already connected.
    pub fn bind_hierarchical(&self, outer: &dyn InitiatorSide<P>) -> ChannelResult<()> {
        tracing::debug!(socket = %self.name(), outer = %outer.name(), "chaining tap initiator");
        self.splice()?;
        self.tap.fw_port().bind(outer.fw_port_iface())?;
        outer.bw_export().bind(self.tap.as_bw_iface())?;
        Ok(())
    }

    /// Attach the owner's backward-call handler.
    ///
    /// Attaching a handler does not splice the tap; recording begins once
    /// the socket is bound into a channel.
    pub fn bind_backward(&self, handler: Rc<dyn BwTransport<P>>) -> ChannelResult<()> {
        self.socket.bind_backward(handler)
    }

    /// Issue a forward call through this socket.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Unbound`](patchbay_core::ChannelError) when the
    /// forward path is not fully connected.
    pub fn fw_transport(
        &self,
        txn: &mut P::Payload,
        phase: &mut P::Phase,
    ) -> ChannelResult<P::Status> {
        self.socket.fw_transport(txn, phase)
    }

    /// Wire the tap between the owner-facing socket and the outbound slots.
    /// Requests leave through the tap's forward port; replies reaching the
    /// tap resolve through the socket's backward export at call time.
    fn splice(&self) -> ChannelResult<()> {
        self.socket.fw_port().bind(self.tap.as_fw_iface())?;
        self.tap
            .bw_port()
            .bind(self.socket.bw_export().as_bw_iface())?;
        Ok(())
    }
}

impl<P: Protocol> InitiatorSide<P> for TapInitiatorSocket<P> {
    fn name(&self) -> &str {
        self.socket.name()
    }

    fn fw_port_iface(&self) -> Rc<dyn FwTransport<P>> {
        self.socket.fw_port().as_fw_iface()
    }

    fn bw_export(&self) -> Port<dyn BwTransport<P>> {
        self.socket.bw_export()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use patchbay_core::{MemBus, MemPayload, MemPhase, SyncStatus};

    use crate::sink::MemorySink;
    use crate::tap::{TIMED_FLAG, TRACING_FLAG};

    use super::*;

    struct CountingBackward {
        calls: RefCell<u32>,
    }

    impl BwTransport<MemBus> for CountingBackward {
        fn bw_transport(
            &self,
            _txn: &mut MemPayload,
            _phase: &mut MemPhase,
        ) -> ChannelResult<SyncStatus> {
            *self.calls.borrow_mut() += 1;
            Ok(SyncStatus::Accepted)
        }
    }

    #[test]
    fn test_auto_named_socket_registers_both_flags() {
        let m = TapInitiatorSocket::<MemBus>::new(Rc::new(MemorySink::new()));

        assert!(m.name().starts_with(NAME_BASE));
        assert_eq!(m.attributes().len(), 2);
        assert!(m.attributes().get(TRACING_FLAG).is_some());
        assert!(m.attributes().get(TIMED_FLAG).is_some());
    }

    #[test]
    fn test_named_socket_skips_attribute_registration() {
        let m = TapInitiatorSocket::<MemBus>::with_name("dut_master", Rc::new(MemorySink::new()));

        assert_eq!(m.name(), "dut_master");
        assert!(m.attributes().is_empty());
    }

    #[test]
    fn test_registered_flag_shares_state_with_the_tap() {
        let m = TapInitiatorSocket::<MemBus>::new(Rc::new(MemorySink::new()));

        let flag = m
            .attributes()
            .get(TRACING_FLAG)
            .expect("tracing flag registered");
        flag.set(false);

        assert!(!m.tracing_flag().get());
    }

    #[test]
    fn test_backward_attach_alone_leaves_the_tap_off_the_path() {
        let sink = MemorySink::new();
        let m = TapInitiatorSocket::<MemBus>::with_name("bare", Rc::new(sink.clone()));
        let handler = Rc::new(CountingBackward {
            calls: RefCell::new(0),
        });
        m.bind_backward(handler.clone()).expect("attach handler");

        let mut reply = MemPayload::read(0, 1);
        let mut phase = MemPhase::Response;
        m.bw_export()
            .get()
            .expect("handler attached")
            .bw_transport(&mut reply, &mut phase)
            .expect("reply delivered");

        assert_eq!(*handler.calls.borrow(), 1);
        assert!(sink.is_empty());
    }
}
