//! Plain channel endpoints: originating and receiving sockets.
//!
//! A socket owns the connection slots one channel role needs:
//!
//! - [`InitiatorSocket`]: a forward port the owner calls out through and a
//!   backward export peers call back through
//! - [`TargetSocket`]: a forward export peers call in through and a backward
//!   port the owner calls back out through
//!
//! The side traits [`InitiatorSide`] and [`TargetSide`] describe what a bind
//! peer must expose. Plain sockets and tap wrappers implement them alike, so
//! wiring code never distinguishes wrapped from unwrapped peers.
//!
//! Binding always follows the forward call direction: `a.bind(b)` and
//! `a.bind_hierarchical(b)` mean request-direction calls flow from `a`'s
//! side toward `b`'s side.

use std::rc::Rc;

use crate::error::ChannelResult;
use crate::naming::derived_name;
use crate::port::Port;
use crate::transport::{BwTransport, FwTransport, Protocol};

/// What an originating-role bind peer exposes.
pub trait InitiatorSide<P: Protocol> {
    /// Diagnostic name of this side.
    fn name(&self) -> &str;

    /// The side's forward port as a callable interface. Resolution happens
    /// at call time, so chains may be wired in any order.
    fn fw_port_iface(&self) -> Rc<dyn FwTransport<P>>;

    /// The backward export slot an inner endpoint's replies resolve through.
    fn bw_export(&self) -> Port<dyn BwTransport<P>>;
}

/// What a receiving-role bind peer exposes.
pub trait TargetSide<P: Protocol> {
    /// Diagnostic name of this side.
    fn name(&self) -> &str;

    /// The side's exported forward interface. Resolution happens at call
    /// time.
    fn fw_iface(&self) -> Rc<dyn FwTransport<P>>;

    /// The backward port through which this side's reply calls leave.
    fn bw_port(&self) -> Port<dyn BwTransport<P>>;
}

/// A plain originating endpoint.
///
/// The owner issues requests through [`fw_transport`](Self::fw_transport)
/// and receives replies on the handler attached with
/// [`bind_backward`](Self::bind_backward).
pub struct InitiatorSocket<P: Protocol> {
    name: String,
    fw_port: Port<dyn FwTransport<P>>,
    bw_export: Port<dyn BwTransport<P>>,
}

impl<P: Protocol> InitiatorSocket<P> {
    /// Create a socket with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let fw_port = Port::new(derived_name(&name, "fw_port"));
        let bw_export = Port::new(derived_name(&name, "bw_export"));
        Self {
            name,
            fw_port,
            bw_export,
        }
    }

    /// Socket name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle to the raw forward port.
    pub fn fw_port(&self) -> Port<dyn FwTransport<P>> {
        self.fw_port.clone()
    }

    /// Connect to a receiving-side peer (leaf binding).
    ///
    /// # Errors
    ///
    /// Propagates [`ChannelError::AlreadyBound`](crate::ChannelError) when a
    /// slot on either side is already connected.
    pub fn bind(&self, peer: &dyn TargetSide<P>) -> ChannelResult<()> {
        tracing::debug!(socket = %self.name, peer = %peer.name(), "binding initiator to target");
        self.fw_port.bind(peer.fw_iface())?;
        peer.bw_port().bind(self.bw_export.as_bw_iface())?;
        Ok(())
    }

    /// Chain into an enclosing originating-side endpoint (hierarchical
    /// binding): requests continue out through `outer`'s port, and `outer`'s
    /// backward export resolves through this socket's.
    pub fn bind_hierarchical(&self, outer: &dyn InitiatorSide<P>) -> ChannelResult<()> {
        tracing::debug!(socket = %self.name, outer = %outer.name(), "chaining initiator");
        self.fw_port.bind(outer.fw_port_iface())?;
        outer.bw_export().bind(self.bw_export.as_bw_iface())?;
        Ok(())
    }

    /// Attach the owner's backward-call handler.
    pub fn bind_backward(&self, handler: Rc<dyn BwTransport<P>>) -> ChannelResult<()> {
        self.bw_export.bind(handler)
    }

    /// Issue a forward call through this socket.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Unbound`](crate::ChannelError) when the forward path
    /// is not fully connected.
    pub fn fw_transport(
        &self,
        txn: &mut P::Payload,
        phase: &mut P::Phase,
    ) -> ChannelResult<P::Status> {
        self.fw_port.get()?.fw_transport(txn, phase)
    }
}

impl<P: Protocol> InitiatorSide<P> for InitiatorSocket<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn fw_port_iface(&self) -> Rc<dyn FwTransport<P>> {
        self.fw_port.as_fw_iface()
    }

    fn bw_export(&self) -> Port<dyn BwTransport<P>> {
        self.bw_export.clone()
    }
}

/// A plain receiving endpoint.
///
/// The owner attaches its request handler with
/// [`bind_forward`](Self::bind_forward) and issues replies through
/// [`bw_transport`](Self::bw_transport).
pub struct TargetSocket<P: Protocol> {
    name: String,
    fw_export: Port<dyn FwTransport<P>>,
    bw_port: Port<dyn BwTransport<P>>,
}

impl<P: Protocol> TargetSocket<P> {
    /// Create a socket with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let fw_export = Port::new(derived_name(&name, "fw_export"));
        let bw_port = Port::new(derived_name(&name, "bw_port"));
        Self {
            name,
            fw_export,
            bw_port,
        }
    }

    /// Socket name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle to the raw forward export.
    pub fn fw_export(&self) -> Port<dyn FwTransport<P>> {
        self.fw_export.clone()
    }

    /// Attach the owner's forward-call handler (leaf binding).
    pub fn bind_forward(&self, handler: Rc<dyn FwTransport<P>>) -> ChannelResult<()> {
        self.fw_export.bind(handler)
    }

    /// Chain an inner receiving-side endpoint (hierarchical binding):
    /// requests arriving here continue into `inner`, and `inner`'s replies
    /// continue out through this socket's port.
    pub fn bind_hierarchical(&self, inner: &dyn TargetSide<P>) -> ChannelResult<()> {
        tracing::debug!(socket = %self.name, inner = %inner.name(), "chaining target");
        self.fw_export.bind(inner.fw_iface())?;
        inner.bw_port().bind(self.bw_port.as_bw_iface())?;
        Ok(())
    }

    /// Issue a backward call through this socket.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Unbound`](crate::ChannelError) when the backward path
    /// is not fully connected.
    pub fn bw_transport(
        &self,
        txn: &mut P::Payload,
        phase: &mut P::Phase,
    ) -> ChannelResult<P::Status> {
        self.bw_port.get()?.bw_transport(txn, phase)
    }
}

impl<P: Protocol> TargetSide<P> for TargetSocket<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn fw_iface(&self) -> Rc<dyn FwTransport<P>> {
        self.fw_export.as_fw_iface()
    }

    fn bw_port(&self) -> Port<dyn BwTransport<P>> {
        self.bw_port.clone()
    }
}
