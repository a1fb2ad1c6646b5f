//! Client-side netcode: prediction, reconciliation and interpolation.
//!
//! These modules are the client half of the synchronization scheme. A client
//! renders its own entity from the [`Predictor`] (optimistic, corrected by
//! the [`Reconciler`] on every authoritative update) and every remote entity
//! through the [`Interpolator`] (time-delayed, smoothed). They share the
//! movement integration step and `WorldConfig` with the server; that
//! identity is what makes reconciliation converge.

pub mod interpolator;
pub mod predictor;
pub mod reconciler;

pub use interpolator::Interpolator;
pub use predictor::Predictor;
pub use reconciler::Reconciler;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::game::World;
    use crate::ws::protocol::{ClientMsg, MoveInput, UpdateRecord};

    /// Two clients join; A sends 10 move-up inputs; A's reconciled state
    /// matches the server exactly and B's interpolated view of A converges
    /// within one interpolation-delay window.
    #[test]
    fn two_client_end_to_end_scenario() {
        let cfg = WorldConfig::default();
        let mut world = World::new(cfg, 99);

        let a = world.join();
        let b = world.join();
        let start_a = world.player(a).unwrap().entity_state();
        let step = cfg.move_step();

        let mut predictor_a = Predictor::new(cfg, start_a);
        let mut interpolator_b = Interpolator::new(&cfg);

        let tick_ms = cfg.tick_interval().as_millis() as u64;
        let mut now = 10_000u64;

        // One input per tick, transported instantly
        for _ in 0..10 {
            let msg = predictor_a.predict(MoveInput {
                up: true,
                ..Default::default()
            });
            let Some(ClientMsg::Move {
                direction,
                sequence_number,
            }) = msg
            else {
                panic!("predictor must emit move messages");
            };
            world.apply_move(a, direction, sequence_number);

            now += tick_ms;
            for update in world.step(now) {
                if let UpdateRecord::PlayerUpdate {
                    id,
                    x,
                    y,
                    angle,
                    sequence_number,
                } = update
                {
                    if id == a {
                        let authoritative = crate::game::EntityState { x, y, angle };
                        // Client A reconciles against the correction
                        Reconciler::reconcile(&mut predictor_a, authoritative, sequence_number);
                        // Client B buffers A's state for interpolation
                        interpolator_b.add_state(a, authoritative, now);
                    }
                }
            }
        }

        let expected_y = (start_a.y - 10.0 * step).clamp(
            cfg.player_radius,
            cfg.map_size - cfg.player_radius,
        );

        // A's reconciled prediction equals the authoritative state exactly
        let server_state = world.player(a).unwrap().entity_state();
        assert_eq!(predictor_a.state(), server_state);
        assert_eq!(server_state.y, expected_y);
        assert_eq!(predictor_a.pending_len(), 0);

        // B's delayed view converges to the same position within one
        // interpolation-delay window after the last update
        let rendered = interpolator_b
            .render(a, now + cfg.interpolation_delay_ms + tick_ms)
            .expect("B has samples for A");
        assert!((rendered.x - server_state.x).abs() < 1e-3);
        assert!((rendered.y - server_state.y).abs() < 1e-3);
        let _ = b;
    }

    /// Identical base state and input list on both sides reconciles to the
    /// exact server state even when acknowledgments lag behind.
    #[test]
    fn reconciliation_converges_with_lagged_acks() {
        let cfg = WorldConfig::default();
        let mut world = World::new(cfg, 5);
        let a = world.join();
        let start = world.player(a).unwrap().entity_state();
        let mut predictor = Predictor::new(cfg, start);

        let inputs = [
            MoveInput {
                up: true,
                ..Default::default()
            },
            MoveInput {
                up: true,
                right: true,
                ..Default::default()
            },
            MoveInput {
                right: true,
                ..Default::default()
            },
            MoveInput {
                down: true,
                left: true,
                ..Default::default()
            },
        ];

        // Send 20 inputs, but only every third tick delivers a correction
        let mut now = 0u64;
        for i in 0..20u32 {
            let input = inputs[(i as usize) % inputs.len()];
            let Some(ClientMsg::Move {
                direction,
                sequence_number,
            }) = predictor.predict(input)
            else {
                panic!("predictor must emit move messages");
            };
            world.apply_move(a, direction, sequence_number);
            now += 16;
            let updates = world.step(now);

            if i % 3 == 0 {
                for update in updates {
                    if let UpdateRecord::PlayerUpdate {
                        id,
                        x,
                        y,
                        angle,
                        sequence_number,
                    } = update
                    {
                        if id == a {
                            Reconciler::reconcile(
                                &mut predictor,
                                crate::game::EntityState { x, y, angle },
                                sequence_number,
                            );
                        }
                    }
                }
            }
        }

        // Final correction confirms everything
        let server_state = world.player(a).unwrap().entity_state();
        let watermark = world.player(a).unwrap().last_input_seq;
        let corrected = Reconciler::reconcile(&mut predictor, server_state, watermark);
        assert_eq!(corrected, server_state);
    }
}
