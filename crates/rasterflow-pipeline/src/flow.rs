//! The valid/ready flow-control primitive every stage pair communicates
//! through.
//!
//! A [`FlowChannel`] is a one-slot ownership-transfer register. The
//! source *offers* a transfer into the slot; the sink *takes* it. A
//! transfer commits only when both sides align in the same tick, which
//! in this model means: the slot was empty when the source offered, and
//! the sink took the held value. The API is shaped so the protocol
//! invariants hold structurally rather than by discipline:
//!
//! - an occupied slot rejects further offers without touching the held
//!   payload, so offered data stays bit-identical across stall ticks;
//! - there is no withdraw operation, so a source can never retract an
//!   offered transfer before commit;
//! - a freshly constructed channel holds nothing, so no data is valid
//!   until at least one tick after reset.
//!
//! Each channel counts its commits, which is what the conservation
//! properties (windows emitted per frame equals pixels accepted, and so
//! on) are checked against.

use crate::types::Transfer;

/// One-slot valid/ready channel between a source stage and a sink stage.
#[derive(Debug)]
pub struct FlowChannel<T> {
    slot: Option<Transfer<T>>,
    commits: u64,
}

impl<T> FlowChannel<T> {
    /// Create an empty channel. No transfer is valid until the source
    /// offers one on a later tick.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: None,
            commits: 0,
        }
    }

    /// Whether the channel currently holds an offered transfer
    /// (the sink-visible `valid` signal).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.slot.is_some()
    }

    /// Whether the channel can accept an offer this tick
    /// (the source-visible `ready` signal).
    #[must_use]
    pub const fn can_accept(&self) -> bool {
        self.slot.is_none()
    }

    /// Offer a transfer. Returns `true` if the slot accepted it.
    ///
    /// A full slot rejects the offer and keeps the previously offered
    /// transfer untouched; the source must retry with the same payload
    /// on a later tick (backpressure).
    pub fn offer(&mut self, transfer: Transfer<T>) -> bool {
        if self.slot.is_some() {
            return false;
        }
        self.slot = Some(transfer);
        true
    }

    /// Observe the offered transfer without committing it.
    #[must_use]
    pub const fn peek(&self) -> Option<&Transfer<T>> {
        self.slot.as_ref()
    }

    /// Commit: consume the offered transfer, freeing the slot for the
    /// source's next offer.
    pub fn take(&mut self) -> Option<Transfer<T>> {
        let taken = self.slot.take();
        if taken.is_some() {
            self.commits += 1;
        }
        taken
    }

    /// Number of transfers committed through this channel since
    /// construction or the last [`reset_commits`](Self::reset_commits).
    #[must_use]
    pub const fn commits(&self) -> u64 {
        self.commits
    }

    /// Zero the commit counter (the held transfer, if any, is kept).
    pub const fn reset_commits(&mut self) {
        self.commits = 0;
    }
}

impl<T> Default for FlowChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}
