//! Optional companion recording for richer transaction metadata.
//!
//! A [`RecordSink`](crate::sink::RecordSink) captures the transaction payload
//! itself; an [`ExtensionRecorder`] captures whatever travels alongside it
//! (protocol annotations, routing hints, custom bookkeeping) that the payload
//! type does not carry. Taps invoke the recorder as a follow-up to the primary
//! sink, never instead of it.

use patchbay_core::Protocol;

use crate::sink::{Direction, RecordContext};

/// Companion recorder invoked after the primary sink on every recorded call.
///
/// Install one on a wrapper socket with
/// [`set_extension_recorder`](crate::initiator::TapInitiatorSocket::set_extension_recorder).
/// The tap calls [`record_extensions`](Self::record_extensions) once per
/// recorded transaction, with the same context the sink already received. A
/// tap with no recorder installed skips this step entirely, and calls that
/// are not recorded (tracing disabled) never reach the recorder either. A
/// recorder holding a handle onto its own tap may replace or remove itself
/// from inside the callback.
pub trait ExtensionRecorder<P: Protocol> {
    /// Record auxiliary data attached to `txn`.
    ///
    /// `direction` and `ctx` match the values just passed to the primary
    /// sink for the same call.
    fn record_extensions(&self, direction: Direction, txn: &P::Payload, ctx: &RecordContext<'_>);
}
