//! Reconciliation of local prediction against authoritative corrections.
//!
//! When the server acknowledges inputs up to some sequence, the acknowledged
//! predictions are discarded and every remaining buffered input is replayed,
//! in order, on top of the authoritative base. Because client and server run
//! the identical integration step, agreement is a silent no-op; only genuine
//! divergence produces a visible correction.

use crate::game::movement::{step_movement, EntityState};

use super::predictor::Predictor;

pub struct Reconciler;

impl Reconciler {
    /// Correct the predictor against an authoritative state.
    ///
    /// `last_processed_seq` is the server's watermark for the local entity.
    /// With an empty (or fully acknowledged) buffer the authoritative state
    /// is adopted directly. Returns the corrected predicted state.
    pub fn reconcile(
        predictor: &mut Predictor,
        authoritative: EntityState,
        last_processed_seq: u32,
    ) -> EntityState {
        predictor.discard_through(last_processed_seq);

        let mut state = authoritative;
        // Replay unacknowledged inputs in sequence order atop the new base
        let cfg = *predictor.config();
        for pending in predictor.pending() {
            state = step_movement(state, pending.input, &cfg);
        }

        predictor.set_state(state);
        state
    }
}
