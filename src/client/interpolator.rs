//! Time-delayed interpolation for remote entities.
//!
//! Remote entities are rendered a fixed delay in the past so that two
//! bracketing samples are normally available, hiding network jitter. With
//! too little data the latest known state is returned unmodified; there is
//! no extrapolation past what the server has sent.

use std::collections::{HashMap, VecDeque};

use tracing::debug;
use uuid::Uuid;

use crate::config::WorldConfig;
use crate::game::movement::{lerp, lerp_angle, EntityState};

/// One buffered remote-entity sample
#[derive(Debug, Clone, Copy)]
struct Sample {
    state: EntityState,
    received_at_ms: u64,
}

/// Interpolation buffers for all remote entities
pub struct Interpolator {
    delay_ms: u64,
    retention_ms: u64,
    buffers: HashMap<Uuid, VecDeque<Sample>>,
}

impl Interpolator {
    pub fn new(cfg: &WorldConfig) -> Self {
        Self {
            delay_ms: cfg.interpolation_delay_ms,
            retention_ms: cfg.interpolation_retention_ms,
            buffers: HashMap::new(),
        }
    }

    /// Append a sample for an entity and evict everything older than the
    /// retention window.
    ///
    /// Samples must arrive in timestamp order (the transport preserves
    /// per-connection order); anything out of order is dropped.
    pub fn add_state(&mut self, id: Uuid, state: EntityState, received_at_ms: u64) {
        let buffer = self.buffers.entry(id).or_default();

        if let Some(last) = buffer.back() {
            if received_at_ms < last.received_at_ms {
                debug!(entity_id = %id, "Out-of-order sample dropped");
                return;
            }
        }

        buffer.push_back(Sample {
            state,
            received_at_ms,
        });

        let cutoff = received_at_ms.saturating_sub(self.retention_ms);
        while let Some(front) = buffer.front() {
            if front.received_at_ms < cutoff {
                buffer.pop_front();
            } else {
                break;
            }
        }
    }

    /// Forget an entity entirely (it left the world)
    pub fn remove(&mut self, id: Uuid) {
        self.buffers.remove(&id);
    }

    /// Render an entity's state at `now_ms`, delayed and interpolated.
    ///
    /// Pure with respect to the buffers. Returns `None` only when no sample
    /// for the entity has ever been seen (or it was removed).
    pub fn render(&self, id: Uuid, now_ms: u64) -> Option<EntityState> {
        let buffer = self.buffers.get(&id)?;
        let latest = buffer.back()?;

        let target = now_ms.saturating_sub(self.delay_ms);

        // Latest sample at or before target, earliest after it
        let after_idx = buffer
            .iter()
            .position(|sample| sample.received_at_ms > target);
        let (before, after) = match after_idx {
            Some(0) | None => {
                // No bracketing pair: degrade to the most recent known state
                return Some(latest.state);
            }
            Some(idx) => (&buffer[idx - 1], &buffer[idx]),
        };

        let span = (after.received_at_ms - before.received_at_ms) as f32;
        let elapsed = (target - before.received_at_ms) as f32;
        let t = (elapsed / span).clamp(0.0, 1.0);

        Some(EntityState {
            x: lerp(before.state.x, after.state.x, t),
            y: lerp(before.state.y, after.state.y, t),
            angle: lerp_angle(before.state.angle, after.state.angle, t),
        })
    }
}
