//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Movement direction set for one input command.
///
/// Opposing directions cancel; diagonals compose. Heading is aimed by
/// shooting, not by movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInput {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
}

impl MoveInput {
    pub fn is_empty(&self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Movement input, stamped with a strictly increasing sequence number
    #[serde(rename_all = "camelCase")]
    Move {
        direction: MoveInput,
        sequence_number: u32,
    },

    /// Fire a bullet. The client allocates the bullet id; aim is either an
    /// explicit angle in radians or a target point resolved via atan2.
    #[serde(rename_all = "camelCase")]
    Shoot {
        bullet_id: Uuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        angle: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_x: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_y: Option<f32>,
    },

    /// Ping for latency measurement
    Ping { id: u64 },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Full enumeration of the world, sent once on join
    FullSnapshot {
        /// The joining session's own entity
        player: PlayerView,
        /// Every player currently in the world (the new one included)
        players: Vec<PlayerView>,
        /// Every live bullet
        bullets: Vec<BulletView>,
    },

    /// Per-tick delta, sent only when non-empty
    Update { updates: Vec<UpdateRecord> },

    /// Pong response, echoes the client id
    Pong { id: u64 },
}

/// Player state as seen on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    /// Heading in radians
    pub angle: f32,
    /// Last input sequence the server has processed for this player
    pub sequence_number: u32,
}

/// Bullet state as seen on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletView {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    /// Ticks this bullet has been advanced (for client-side ordering)
    pub sequence_number: u32,
}

/// Typed change records batched into one per-tick update
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UpdateRecord {
    /// A player mutated this tick
    #[serde(rename_all = "camelCase")]
    PlayerUpdate {
        id: Uuid,
        x: f32,
        y: f32,
        angle: f32,
        sequence_number: u32,
    },

    /// A bullet advanced this tick
    #[serde(rename_all = "camelCase")]
    BulletUpdate {
        id: Uuid,
        x: f32,
        y: f32,
        sequence_number: u32,
    },

    /// A bullet left the world (hit or TTL expiry)
    BulletRemove { id: Uuid },

    /// A bullet struck a player at this position
    Explosion { x: f32, y: f32 },

    /// A player entered the world
    PlayerJoin { id: Uuid, x: f32, y: f32, angle: f32 },

    /// A player left the world
    PlayerLeave { id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_message_wire_format() {
        let msg: ClientMsg = serde_json::from_str(
            r#"{"action":"move","direction":{"up":true},"sequenceNumber":5}"#,
        )
        .unwrap();
        match msg {
            ClientMsg::Move {
                direction,
                sequence_number,
            } => {
                assert!(direction.up && !direction.down);
                assert_eq!(sequence_number, 5);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn shoot_accepts_angle_or_target() {
        let id = Uuid::new_v4();
        let with_angle = format!(r#"{{"action":"shoot","bulletId":"{}","angle":1.0}}"#, id);
        let with_target = format!(
            r#"{{"action":"shoot","bulletId":"{}","targetX":10.0,"targetY":20.0}}"#,
            id
        );
        assert!(serde_json::from_str::<ClientMsg>(&with_angle).is_ok());
        assert!(serde_json::from_str::<ClientMsg>(&with_target).is_ok());
    }

    #[test]
    fn update_records_use_camel_case_tags() {
        let update = ServerMsg::Update {
            updates: vec![
                UpdateRecord::BulletRemove { id: Uuid::nil() },
                UpdateRecord::Explosion { x: 1.0, y: 2.0 },
            ],
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains(r#""type":"update""#));
        assert!(json.contains(r#""type":"bulletRemove""#));
        assert!(json.contains(r#""type":"explosion""#));
    }

    #[test]
    fn player_update_uses_camel_case_fields() {
        let record = UpdateRecord::PlayerUpdate {
            id: Uuid::nil(),
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            sequence_number: 7,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""sequenceNumber":7"#));
    }
}
