//! Client-side prediction for the local entity.
//!
//! Inputs are stamped with a strictly increasing sequence number, applied
//! optimistically through the same integration step the server runs, and
//! buffered until the server acknowledges them.

use std::collections::VecDeque;

use crate::config::WorldConfig;
use crate::game::movement::{step_movement, EntityState};
use crate::ws::protocol::{ClientMsg, MoveInput};

/// One not-yet-acknowledged input and the state predicted after it
#[derive(Debug, Clone)]
pub struct PendingInput {
    pub sequence_number: u32,
    pub input: MoveInput,
    pub predicted: EntityState,
}

/// Prediction engine for the local entity
pub struct Predictor {
    cfg: WorldConfig,
    /// Pending inputs, oldest first; sequence numbers strictly increasing
    pending: VecDeque<PendingInput>,
    next_sequence: u32,
    /// Latest predicted state, what the local entity renders as
    state: EntityState,
}

impl Predictor {
    /// Create a predictor from the authoritative state in the join snapshot
    pub fn new(cfg: WorldConfig, initial: EntityState) -> Self {
        Self {
            cfg,
            pending: VecDeque::new(),
            next_sequence: 1,
            state: initial,
        }
    }

    /// Apply an input locally before any server acknowledgment.
    ///
    /// Returns the stamped wire message to send, or `None` for an input
    /// that moves nothing; idle frames consume no sequence number and put
    /// nothing on the wire. The pending buffer is bounded; if the server
    /// falls further behind than the cap, the oldest predictions are
    /// evicted and the next reconciliation adopts the authoritative state
    /// for them.
    pub fn predict(&mut self, input: MoveInput) -> Option<ClientMsg> {
        if input.is_empty() {
            return None;
        }

        let sequence_number = self.next_sequence;
        self.next_sequence += 1;

        self.state = step_movement(self.state, input, &self.cfg);

        if self.pending.len() >= self.cfg.pending_input_cap {
            self.pending.pop_front();
        }
        self.pending.push_back(PendingInput {
            sequence_number,
            input,
            predicted: self.state,
        });

        Some(ClientMsg::Move {
            direction: input,
            sequence_number,
        })
    }

    /// The state the local entity currently renders as
    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Highest sequence number handed out so far (0 before the first input)
    pub fn last_sequence(&self) -> u32 {
        self.next_sequence - 1
    }

    pub(crate) fn config(&self) -> &WorldConfig {
        &self.cfg
    }

    pub(crate) fn pending(&self) -> &VecDeque<PendingInput> {
        &self.pending
    }

    /// Drop every buffered prediction at or below the acknowledged sequence
    pub(crate) fn discard_through(&mut self, sequence_number: u32) {
        while let Some(front) = self.pending.front() {
            if front.sequence_number <= sequence_number {
                self.pending.pop_front();
            } else {
                break;
            }
        }
    }

    pub(crate) fn set_state(&mut self, state: EntityState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predictor() -> Predictor {
        Predictor::new(
            WorldConfig::default(),
            EntityState {
                x: 500.0,
                y: 500.0,
                angle: 0.0,
            },
        )
    }

    fn up() -> MoveInput {
        MoveInput {
            up: true,
            ..Default::default()
        }
    }

    #[test]
    fn stamps_strictly_increasing_contiguous_sequences() {
        let mut p = predictor();
        for expected in 1u32..=5 {
            match p.predict(up()) {
                Some(ClientMsg::Move {
                    sequence_number, ..
                }) => assert_eq!(sequence_number, expected),
                other => panic!("unexpected message: {:?}", other),
            }
        }
        let seqs: Vec<u32> = p.pending().iter().map(|i| i.sequence_number).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn idle_input_consumes_no_sequence_and_sends_nothing() {
        let mut p = predictor();
        assert!(p.predict(MoveInput::default()).is_none());
        assert_eq!(p.pending_len(), 0);
        assert_eq!(p.last_sequence(), 0);

        // The next real input still gets the first stamp
        match p.predict(up()) {
            Some(ClientMsg::Move {
                sequence_number, ..
            }) => assert_eq!(sequence_number, 1),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn applies_input_optimistically() {
        let mut p = predictor();
        let step = p.config().move_step();
        let _ = p.predict(up());
        assert_eq!(p.state().y, 500.0 - step);
        let _ = p.predict(up());
        assert_eq!(p.state().y, 500.0 - 2.0 * step);
    }

    #[test]
    fn buffer_is_bounded() {
        let cfg = WorldConfig {
            pending_input_cap: 8,
            ..Default::default()
        };
        let mut p = Predictor::new(
            cfg,
            EntityState {
                x: 500.0,
                y: 500.0,
                angle: 0.0,
            },
        );
        for _ in 0..20 {
            let _ = p.predict(up());
        }
        assert_eq!(p.pending_len(), 8);
        // Oldest evicted, newest kept
        assert_eq!(p.pending().front().unwrap().sequence_number, 13);
        assert_eq!(p.pending().back().unwrap().sequence_number, 20);
    }
}
