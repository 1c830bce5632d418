//! Receiving-side wrapper socket with a built-in recording tap.
//!
//! [`TapTargetSocket`] is a drop-in replacement for a plain
//! [`TargetSocket`]: peers bind to it and the owner attaches its request
//! handler exactly as before. The wrapper's [`ChannelTap`] is spliced so
//! that requests are recorded before they reach the handler and replies are
//! recorded before they leave toward the peer.
//!
//! A wrapper built with [`delegating`](TapTargetSocket::delegating) hands
//! forward attachments through unchanged instead of splicing the tap into
//! the request path. Replies issued by the owner still cross the tap. This
//! suits boundary sockets that merely re-export an inner endpoint which
//! does its own request-side recording.

use std::rc::Rc;

use patchbay_core::{
    unique_name, AttributeSet, BwTransport, ChannelResult, ConfigFlag, FwTransport, Port,
    Protocol, TargetSide, TargetSocket,
};

use crate::extension::ExtensionRecorder;
use crate::sink::RecordSink;
use crate::tap::ChannelTap;

const NAME_BASE: &str = "tap_target_socket";

/// Receiving endpoint that records all traffic crossing it.
pub struct TapTargetSocket<P: Protocol> {
    socket: TargetSocket<P>,
    tap: ChannelTap<P>,
    attributes: AttributeSet,
    owns_splice: bool,
}

impl<P: Protocol> TapTargetSocket<P> {
    /// Create an auto-named wrapper recording into `sink`.
    ///
    /// The socket is named `tap_target_socket_<n>` and both tap flags are
    /// registered on [`attributes`](Self::attributes) so external tooling can
    /// flip them by name.
    pub fn new(sink: Rc<dyn RecordSink<P>>) -> Self {
        let wrapper = Self::build(unique_name(NAME_BASE), sink, true);
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
        Self::build(name, sink, true)
    }

    /// Create a pass-through boundary wrapper with an explicit name.
    ///
    /// Forward attachments made with [`bind_forward`](Self::bind_forward)
    /// are wired straight to the socket's export, leaving request-side
    /// recording to whatever sits behind this wrapper. Replies issued
    /// through [`bw_transport`](Self::bw_transport) still cross the tap and
    /// are recorded here.
    pub fn delegating(name: impl Into<String>, sink: Rc<dyn RecordSink<P>>) -> Self {
        Self::build(name, sink, false)
    }

    fn build(name: impl Into<String>, sink: Rc<dyn RecordSink<P>>, owns_splice: bool) -> Self {
        let socket = TargetSocket::new(name);
        let tap = ChannelTap::new(socket.name(), sink);
        tracing::debug!(
            socket = %socket.name(),
            tap = %tap.name(),
            owns_splice,
            "created tap target socket"
        );
        Self {
            socket,
            tap,
            attributes: AttributeSet::new(),
            owns_splice,
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

    /// Attach the owner's forward-call handler (leaf binding).
    ///
    /// In the default mode the tap is spliced in front of the handler, so
    /// requests are recorded before delivery. A
    /// [`delegating`](Self::delegating) wrapper attaches the handler
    /// directly instead.
    ///
    /// # Errors
    ///
    /// Propagates [`ChannelError::AlreadyBound`](patchbay_core::ChannelError)
    /// when the forward slots are already connected.
    pub fn bind_forward(&self, handler: Rc<dyn FwTransport<P>>) -> ChannelResult<()> {
        if self.owns_splice {
            self.socket.fw_export().bind(self.tap.as_fw_iface())?;
            self.tap.fw_port().bind(handler)
        } else {
            self.socket.fw_export().bind(handler)
        }
    }

    /// Chain an inner receiving-side endpoint (hierarchical binding).
    ///
    /// Requests arriving here continue into `inner` through this wrapper's
    /// forward path, and `inner`'s replies continue out through this
    /// wrapper's tap.
    ///
    /// # Errors
    ///
    /// Propagates [`ChannelError::AlreadyBound`](patchbay_core::ChannelError)
    /// when any slot along the chain is already connected.
    pub fn bind_hierarchical(&self, inner: &dyn TargetSide<P>) -> ChannelResult<()> {
        tracing::debug!(socket = %self.name(), inner = %inner.name(), "chaining tap target");
        self.bind_forward(inner.fw_iface())?;
        inner.bw_port().bind(self.tap.as_bw_iface())?;
        Ok(())
    }

    /// Issue a backward call through this socket.
    ///
    /// The owner's replies always cross the tap, in every construction
    /// mode.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Unbound`](patchbay_core::ChannelError) when the
    /// backward path is not fully connected.
    pub fn bw_transport(
        &self,
        txn: &mut P::Payload,
        phase: &mut P::Phase,
    ) -> ChannelResult<P::Status> {
        self.tap.bw_transport(txn, phase)
    }
}

impl<P: Protocol> TargetSide<P> for TapTargetSocket<P> {
    fn name(&self) -> &str {
        self.socket.name()
    }

    fn fw_iface(&self) -> Rc<dyn FwTransport<P>> {
        self.socket.fw_export().as_fw_iface()
    }

    // Peers deposit their reply receiver in the tap's outbound port, not the
    // underlying socket's, so replies cross the tap on their way out.
    fn bw_port(&self) -> Port<dyn BwTransport<P>> {
        self.tap.bw_port()
    }
}
