//! Transport contracts for bidirectional transaction channels.
//!
//! A channel moves one [`Protocol`]'s transactions between an originating
//! endpoint and a receiving endpoint. Calls are synchronous call-and-return:
//! the caller hands a mutable transaction and phase to the callee, the callee
//! may update both, and the callee's status travels back on the same stack.
//!
//! The two call directions have separate contracts:
//!
//! - [`FwTransport`]: request direction, issued by the originating side
//! - [`BwTransport`]: response direction, issued by the receiving side

use crate::error::ChannelResult;

/// The families of types moved across one channel.
///
/// A protocol is a zero-cost marker wiring together the payload carried by
/// calls, the phase marker passed alongside it, and the status the callee
/// returns. See [`MemBus`](crate::MemBus) for a complete example.
pub trait Protocol: 'static {
    /// Transaction payload carried by both call directions.
    type Payload;
    /// Phase marker passed alongside the payload.
    type Phase;
    /// Status returned by the callee to the caller.
    type Status;
}

/// Forward-call interface: the contract an originating endpoint uses to
/// issue request-direction calls.
pub trait FwTransport<P: Protocol> {
    /// Deliver one request-direction call.
    ///
    /// The callee may mutate `txn` and `phase` in place; those mutations are
    /// visible to the caller when the call returns.
    ///
    /// # Errors
    ///
    /// Implementations wired through ports surface
    /// [`ChannelError::Unbound`](crate::ChannelError) when the path is not
    /// fully connected.
    fn fw_transport(
        &self,
        txn: &mut P::Payload,
        phase: &mut P::Phase,
    ) -> ChannelResult<P::Status>;
}

/// Backward-call interface: the contract a receiving endpoint uses to issue
/// response-direction calls.
pub trait BwTransport<P: Protocol> {
    /// Deliver one response-direction call.
    ///
    /// Mirror of [`FwTransport::fw_transport`] for the opposite direction.
    ///
    /// # Errors
    ///
    /// Implementations wired through ports surface
    /// [`ChannelError::Unbound`](crate::ChannelError) when the path is not
    /// fully connected.
    fn bw_transport(
        &self,
        txn: &mut P::Payload,
        phase: &mut P::Phase,
    ) -> ChannelResult<P::Status>;
}

/// Conventional status for synchronous request/response protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// The callee accepted the call; the transaction is unchanged.
    Accepted,
    /// The callee updated the transaction or phase.
    Updated,
    /// The callee completed the transaction in place.
    Completed,
}
