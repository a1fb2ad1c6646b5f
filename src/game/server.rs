//! Async shell around the authoritative world: the fixed-rate tick loop.
//!
//! Network I/O never touches the world directly. Sessions submit
//! [`WorldCommand`]s over an mpsc channel (which preserves per-connection
//! send order) and receive per-tick deltas over a broadcast channel. The
//! world is mutated only inside this task, one tick at a time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::interval;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::WorldConfig;
use crate::util::time::unix_millis;
use crate::ws::protocol::{MoveInput, ServerMsg};

use super::movement::aim_angle;
use super::snapshot::full_snapshot;
use super::world::World;

/// Commands submitted by the session layer, drained at tick boundaries
#[derive(Debug)]
pub enum WorldCommand {
    /// Allocate an entity for a new session and reply with its snapshot
    Join { reply: oneshot::Sender<JoinReply> },
    /// Remove a session's entity
    Leave { id: Uuid },
    /// Movement input
    Move {
        id: Uuid,
        direction: MoveInput,
        sequence_number: u32,
    },
    /// Fire input; aim is an explicit angle or a target point
    Shoot {
        id: Uuid,
        bullet_id: Uuid,
        angle: Option<f32>,
        target_x: Option<f32>,
        target_y: Option<f32>,
    },
}

/// Reply to a join command: the allocated entity and the full snapshot
#[derive(Debug)]
pub struct JoinReply {
    pub entity_id: Uuid,
    pub snapshot: ServerMsg,
}

/// Handle to the running world task, the only surface sessions see
#[derive(Clone)]
pub struct WorldHandle {
    pub command_tx: mpsc::Sender<WorldCommand>,
    update_tx: broadcast::Sender<ServerMsg>,
    player_count: Arc<AtomicUsize>,
    current_tick: Arc<std::sync::atomic::AtomicU64>,
}

impl WorldHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.update_tx.subscribe()
    }

    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick.load(Ordering::Relaxed)
    }
}

/// The authoritative game server task
pub struct GameServer {
    world: World,
    command_rx: mpsc::Receiver<WorldCommand>,
    update_tx: broadcast::Sender<ServerMsg>,
    player_count: Arc<AtomicUsize>,
    current_tick: Arc<std::sync::atomic::AtomicU64>,
}

impl GameServer {
    pub fn new(cfg: WorldConfig, seed: u64) -> (Self, WorldHandle) {
        let (command_tx, command_rx) = mpsc::channel(256);
        let (update_tx, _) = broadcast::channel(64);
        let player_count = Arc::new(AtomicUsize::new(0));
        let current_tick = Arc::new(std::sync::atomic::AtomicU64::new(0));

        let handle = WorldHandle {
            command_tx,
            update_tx: update_tx.clone(),
            player_count: player_count.clone(),
            current_tick: current_tick.clone(),
        };

        let server = Self {
            world: World::new(cfg, seed),
            command_rx,
            update_tx,
            player_count,
            current_tick,
        };

        (server, handle)
    }

    /// Run the fixed-rate tick loop until every command sender is dropped
    pub async fn run(mut self) {
        info!(tick_rate = self.world.config().tick_rate, "World task started");

        let mut tick_interval = interval(self.world.config().tick_interval());
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            if self.drain_commands() {
                info!("All sessions gone, world task stopping");
                break;
            }

            let updates = self.world.step(unix_millis());
            self.current_tick.store(self.world.tick, Ordering::Relaxed);
            self.player_count
                .store(self.world.player_count(), Ordering::Relaxed);

            if !updates.is_empty() {
                // Send fails only with zero subscribers, which is fine
                let _ = self.update_tx.send(ServerMsg::Update { updates });
            }
        }
    }

    /// Drain every queued command in arrival order.
    ///
    /// Returns true when the channel is closed (no live sessions remain).
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(WorldCommand::Join { reply }) => {
                    let entity_id = self.world.join();
                    match full_snapshot(&self.world, entity_id) {
                        Some(snapshot) => {
                            if reply.send(JoinReply { entity_id, snapshot }).is_err() {
                                // Session dropped mid-handshake
                                debug!(entity_id = %entity_id, "Join reply dropped, removing entity");
                                self.world.leave(entity_id);
                            }
                        }
                        None => debug!(entity_id = %entity_id, "Entity vanished during join"),
                    }
                }
                Ok(WorldCommand::Leave { id }) => self.world.leave(id),
                Ok(WorldCommand::Move {
                    id,
                    direction,
                    sequence_number,
                }) => self.world.apply_move(id, direction, sequence_number),
                Ok(WorldCommand::Shoot {
                    id,
                    bullet_id,
                    angle,
                    target_x,
                    target_y,
                }) => {
                    let aim = self
                        .world
                        .player(id)
                        .and_then(|p| aim_angle(p.x, p.y, angle, target_x, target_y));
                    match aim {
                        Some(angle) => self.world.apply_shoot(id, bullet_id, angle, unix_millis()),
                        None => debug!(entity_id = %id, "Shoot without usable aim, discarded"),
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => return false,
                Err(mpsc::error::TryRecvError::Disconnected) => return true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::UpdateRecord;

    fn fast_config() -> WorldConfig {
        WorldConfig {
            tick_rate: 240,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn join_handshake_returns_snapshot_and_broadcasts() {
        let (server, handle) = GameServer::new(fast_config(), 1);
        tokio::spawn(server.run());

        let mut updates = handle.subscribe();

        let (reply_tx, reply_rx) = oneshot::channel();
        handle
            .command_tx
            .send(WorldCommand::Join { reply: reply_tx })
            .await
            .unwrap();

        let reply = reply_rx.await.unwrap();
        match reply.snapshot {
            ServerMsg::FullSnapshot { player, .. } => assert_eq!(player.id, reply.entity_id),
            other => panic!("unexpected snapshot: {:?}", other),
        }

        // The same tick's delta announces the join to everyone
        let msg = updates.recv().await.unwrap();
        match msg {
            ServerMsg::Update { updates } => assert!(updates.iter().any(
                |u| matches!(u, UpdateRecord::PlayerJoin { id, .. } if *id == reply.entity_id)
            )),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn move_command_produces_player_update() {
        let (server, handle) = GameServer::new(fast_config(), 1);
        tokio::spawn(server.run());

        let (reply_tx, reply_rx) = oneshot::channel();
        handle
            .command_tx
            .send(WorldCommand::Join { reply: reply_tx })
            .await
            .unwrap();
        let reply = reply_rx.await.unwrap();

        let mut updates = handle.subscribe();
        handle
            .command_tx
            .send(WorldCommand::Move {
                id: reply.entity_id,
                direction: MoveInput {
                    up: true,
                    ..Default::default()
                },
                sequence_number: 1,
            })
            .await
            .unwrap();

        // The acknowledging delta may share a broadcast slot with the join
        // announcement, so scan a few messages
        for _ in 0..5 {
            if let ServerMsg::Update { updates } = updates.recv().await.unwrap() {
                if updates.iter().any(|u| matches!(
                    u,
                    UpdateRecord::PlayerUpdate { id, sequence_number: 1, .. } if *id == reply.entity_id
                )) {
                    return;
                }
            }
        }
        panic!("no player update acknowledging the move");
    }
}
