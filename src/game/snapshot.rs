//! Wire-view building for snapshots

use uuid::Uuid;

use crate::ws::protocol::{BulletView, PlayerView, ServerMsg};

use super::world::{Bullet, PlayerState, World};

pub fn player_view(player: &PlayerState) -> PlayerView {
    PlayerView {
        id: player.id,
        x: player.x,
        y: player.y,
        angle: player.angle,
        sequence_number: player.last_input_seq,
    }
}

pub fn bullet_view(bullet: &Bullet) -> BulletView {
    BulletView {
        id: bullet.id,
        x: bullet.x,
        y: bullet.y,
        sequence_number: bullet.seq,
    }
}

/// Build the full-state snapshot sent once to a joining session.
///
/// Returns `None` if the entity vanished between allocation and snapshot
/// assembly (disconnect raced the join).
pub fn full_snapshot(world: &World, joined_id: Uuid) -> Option<ServerMsg> {
    let own = world.player(joined_id)?;
    Some(ServerMsg::FullSnapshot {
        player: player_view(own),
        players: world.players().map(player_view).collect(),
        bullets: world.bullets().map(bullet_view).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;

    #[test]
    fn full_snapshot_enumerates_all_entities() {
        let mut world = World::new(WorldConfig::default(), 7);
        let a = world.join();
        let b = world.join();
        world.apply_shoot(a, Uuid::new_v4(), 0.0, 10_000);

        let snapshot = full_snapshot(&world, b).unwrap();
        match snapshot {
            ServerMsg::FullSnapshot {
                player,
                players,
                bullets,
            } => {
                assert_eq!(player.id, b);
                assert_eq!(players.len(), 2);
                assert_eq!(bullets.len(), 1);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn full_snapshot_for_unknown_entity_is_none() {
        let world = World::new(WorldConfig::default(), 7);
        assert!(full_snapshot(&world, Uuid::new_v4()).is_none());
    }
}
