//! Bind-once connection slots with call-time resolution.
//!
//! A [`Port`] is a named slot holding at most one interface. It serves both
//! roles a channel endpoint needs:
//!
//! - **port**: the slot an endpoint calls out through
//! - **export**: the slot peers call in through, resolving to the owner's
//!   implementation
//!
//! Ports can be bound to other ports: a port over a transport interface is
//! itself a valid implementation of that interface, resolving its slot at
//! call time and forwarding. Hierarchical chains can therefore be wired in
//! any order; nothing resolves until the first call travels the chain.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{ChannelError, ChannelResult};
use crate::transport::{BwTransport, FwTransport, Protocol};

/// A named, bind-once connection slot for interface `I`.
///
/// Cloning yields another handle to the same slot, so one party can hold a
/// port while handing bind access to another. Single-threaded by design,
/// like the rest of the crate.
pub struct Port<I: ?Sized> {
    inner: Rc<PortInner<I>>,
}

struct PortInner<I: ?Sized> {
    name: String,
    slot: RefCell<Option<Rc<I>>>,
}

impl<I: ?Sized> Port<I> {
    /// Create an unbound port.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(PortInner {
                name: name.into(),
                slot: RefCell::new(None),
            }),
        }
    }

    /// Name assigned at construction.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Bind the port to an interface.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::AlreadyBound`] if the port already holds a
    /// binding; the existing binding is kept.
    pub fn bind(&self, iface: Rc<I>) -> ChannelResult<()> {
        let mut slot = self.inner.slot.borrow_mut();
        if slot.is_some() {
            return Err(ChannelError::AlreadyBound {
                port: self.inner.name.clone(),
            });
        }
        *slot = Some(iface);
        tracing::debug!(port = %self.inner.name, "port bound");
        Ok(())
    }

    /// Whether the port holds a binding.
    pub fn is_bound(&self) -> bool {
        self.inner.slot.borrow().is_some()
    }

    /// Resolve the bound interface.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Unbound`] if nothing is bound yet.
    pub fn get(&self) -> ChannelResult<Rc<I>> {
        self.inner
            .slot
            .borrow()
            .clone()
            .ok_or_else(|| ChannelError::Unbound {
                port: self.inner.name.clone(),
            })
    }
}

// Deriving Clone would require `I: Clone`; the handle is always cloneable.
impl<I: ?Sized> Clone for Port<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<I: ?Sized> fmt::Debug for Port<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.inner.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}

impl<P: Protocol> Port<dyn FwTransport<P>> {
    /// The port itself as a forward interface, for port-to-port chaining.
    pub fn as_fw_iface(&self) -> Rc<dyn FwTransport<P>> {
        Rc::new(self.clone())
    }
}

impl<P: Protocol> Port<dyn BwTransport<P>> {
    /// The port itself as a backward interface, for port-to-port chaining.
    pub fn as_bw_iface(&self) -> Rc<dyn BwTransport<P>> {
        Rc::new(self.clone())
    }
}

impl<P: Protocol> FwTransport<P> for Port<dyn FwTransport<P>> {
    fn fw_transport(
        &self,
        txn: &mut P::Payload,
        phase: &mut P::Phase,
    ) -> ChannelResult<P::Status> {
        self.get()?.fw_transport(txn, phase)
    }
}

impl<P: Protocol> BwTransport<P> for Port<dyn BwTransport<P>> {
    fn bw_transport(
        &self,
        txn: &mut P::Payload,
        phase: &mut P::Phase,
    ) -> ChannelResult<P::Status> {
        self.get()?.bw_transport(txn, phase)
    }
}
