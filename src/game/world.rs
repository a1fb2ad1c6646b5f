//! Authoritative world state and per-tick simulation.
//!
//! `World` exclusively owns canonical entity state. It is synchronous and
//! deterministic given a seed and a clock; the async shell in
//! [`crate::game::server`] drains the command channel into it at tick
//! boundaries and broadcasts the resulting delta.

use std::collections::{HashMap, HashSet};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::WorldConfig;
use crate::ws::protocol::{MoveInput, UpdateRecord};

use super::movement::{step_movement, EntityState};

/// Canonical player state (authoritative)
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    /// Heading in radians, aimed by shooting
    pub angle: f32,
    /// Watermark for stale/duplicate input rejection; non-decreasing
    pub last_input_seq: u32,
    /// Unix millis of the last accepted shot, for the fire cooldown
    pub last_shot_at: u64,
}

impl PlayerState {
    pub fn entity_state(&self) -> EntityState {
        EntityState {
            x: self.x,
            y: self.y,
            angle: self.angle,
        }
    }
}

/// Canonical bullet state (authoritative)
#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    /// Unix millis at spawn, for TTL expiry
    pub created_at: u64,
    /// Ticks this bullet has been advanced
    pub seq: u32,
}

/// The authoritative world aggregate
pub struct World {
    cfg: WorldConfig,
    pub tick: u64,
    players: HashMap<Uuid, PlayerState>,
    bullets: HashMap<Uuid, Bullet>,
    rng: ChaCha8Rng,
    /// Join/leave/collision records queued for the next delta
    pending: Vec<UpdateRecord>,
    /// Players mutated since the last delta
    mutated: HashSet<Uuid>,
}

impl World {
    pub fn new(cfg: WorldConfig, seed: u64) -> Self {
        Self {
            cfg,
            tick: 0,
            players: HashMap::new(),
            bullets: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            pending: Vec::new(),
            mutated: HashSet::new(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.cfg
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    pub fn bullets(&self) -> impl Iterator<Item = &Bullet> {
        self.bullets.values()
    }

    pub fn player(&self, id: Uuid) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Allocate an entity for a new session at a random in-bounds position.
    ///
    /// Queues a `playerJoin` record for the next delta; the full snapshot for
    /// the joining session itself is built separately.
    pub fn join(&mut self) -> Uuid {
        let min = self.cfg.player_radius;
        let max = self.cfg.map_size - self.cfg.player_radius;

        let player = PlayerState {
            id: Uuid::new_v4(),
            x: self.rng.gen_range(min..max),
            y: self.rng.gen_range(min..max),
            angle: self.rng.gen_range(0.0..std::f32::consts::TAU),
            last_input_seq: 0,
            last_shot_at: 0,
        };
        let id = player.id;

        self.pending.push(UpdateRecord::PlayerJoin {
            id,
            x: player.x,
            y: player.y,
            angle: player.angle,
        });
        self.players.insert(id, player);

        info!(entity_id = %id, player_count = self.players.len(), "Player joined");
        id
    }

    /// Remove a session's entity and queue a `playerLeave` record.
    ///
    /// Inputs from the connection still queued behind this command are later
    /// discarded as unknown-entity references.
    pub fn leave(&mut self, id: Uuid) {
        if self.players.remove(&id).is_some() {
            self.mutated.remove(&id);
            self.pending.push(UpdateRecord::PlayerLeave { id });
            info!(entity_id = %id, player_count = self.players.len(), "Player left");
        }
    }

    /// Apply one movement input.
    ///
    /// Stale or duplicate sequence numbers (not greater than the watermark)
    /// are an idempotent no-op, expected under retransmission.
    pub fn apply_move(&mut self, id: Uuid, direction: MoveInput, sequence_number: u32) {
        let Some(player) = self.players.get_mut(&id) else {
            debug!(entity_id = %id, "Move for unknown entity, discarded");
            return;
        };

        if sequence_number <= player.last_input_seq {
            debug!(
                entity_id = %id,
                seq = sequence_number,
                watermark = player.last_input_seq,
                "Stale input, discarded"
            );
            return;
        }

        let next = step_movement(player.entity_state(), direction, &self.cfg);
        player.x = next.x;
        player.y = next.y;
        player.last_input_seq = sequence_number;
        self.mutated.insert(id);
    }

    /// Apply one shoot input.
    ///
    /// Discarded when the cooldown has not elapsed or the bullet id is
    /// already live (idempotency under retransmission). On success the
    /// shooter's heading snaps to the aim angle and a bullet spawns at the
    /// shooter's position with velocity derived from that heading.
    pub fn apply_shoot(&mut self, id: Uuid, bullet_id: Uuid, angle: f32, now_ms: u64) {
        if self.bullets.contains_key(&bullet_id) {
            debug!(entity_id = %id, bullet_id = %bullet_id, "Duplicate bullet id, discarded");
            return;
        }

        let Some(player) = self.players.get_mut(&id) else {
            debug!(entity_id = %id, "Shoot for unknown entity, discarded");
            return;
        };

        if now_ms.saturating_sub(player.last_shot_at) < self.cfg.shot_cooldown_ms {
            debug!(entity_id = %id, "Shot inside cooldown window, discarded");
            return;
        }

        player.angle = angle;
        player.last_shot_at = now_ms;

        let bullet = Bullet {
            id: bullet_id,
            owner_id: id,
            x: player.x,
            y: player.y,
            vel_x: angle.cos() * self.cfg.bullet_speed,
            vel_y: angle.sin() * self.cfg.bullet_speed,
            created_at: now_ms,
            seq: 0,
        };
        self.bullets.insert(bullet_id, bullet);
        self.mutated.insert(id);
    }

    /// Run one simulation tick: advance bullets, resolve collisions and TTL
    /// expiry, and assemble the delta for everything that changed.
    ///
    /// Returns an empty vec on a quiet tick (nothing to broadcast).
    pub fn step(&mut self, now_ms: u64) -> Vec<UpdateRecord> {
        self.tick += 1;
        let dt = self.cfg.tick_delta();

        let mut updates: Vec<UpdateRecord> = std::mem::take(&mut self.pending);

        // One record per player mutated by this tick's inputs
        for id in self.mutated.drain() {
            if let Some(player) = self.players.get(&id) {
                updates.push(UpdateRecord::PlayerUpdate {
                    id,
                    x: player.x,
                    y: player.y,
                    angle: player.angle,
                    sequence_number: player.last_input_seq,
                });
            }
        }

        // Advance bullets: integrate, bounce, collide, expire
        let mut removed: Vec<Uuid> = Vec::new();
        for bullet in self.bullets.values_mut() {
            bullet.x += bullet.vel_x * dt;
            bullet.y += bullet.vel_y * dt;

            let min = self.cfg.bullet_radius;
            let max = self.cfg.map_size - self.cfg.bullet_radius;
            if bullet.x <= min || bullet.x >= max {
                bullet.vel_x = -bullet.vel_x;
            }
            if bullet.y <= min || bullet.y >= max {
                bullet.vel_y = -bullet.vel_y;
            }
            bullet.x = bullet.x.clamp(min, max);
            bullet.y = bullet.y.clamp(min, max);
            bullet.seq += 1;

            // Circle test against all players except the owner
            let hit_radius = self.cfg.player_radius + self.cfg.bullet_radius;
            let hit = self
                .players
                .values()
                .filter(|p| p.id != bullet.owner_id)
                .find(|p| {
                    let dx = p.x - bullet.x;
                    let dy = p.y - bullet.y;
                    dx * dx + dy * dy < hit_radius * hit_radius
                });

            if let Some(target) = hit {
                updates.push(UpdateRecord::Explosion {
                    x: target.x,
                    y: target.y,
                });
                updates.push(UpdateRecord::BulletRemove { id: bullet.id });
                removed.push(bullet.id);
            } else if now_ms.saturating_sub(bullet.created_at) > self.cfg.bullet_ttl_ms {
                // TTL expiry: removal record only, no collision event
                updates.push(UpdateRecord::BulletRemove { id: bullet.id });
                removed.push(bullet.id);
            } else {
                updates.push(UpdateRecord::BulletUpdate {
                    id: bullet.id,
                    x: bullet.x,
                    y: bullet.y,
                    sequence_number: bullet.seq,
                });
            }
        }

        for id in removed {
            self.bullets.remove(&id);
        }

        updates
    }
}
