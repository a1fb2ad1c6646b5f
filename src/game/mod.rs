//! Authoritative simulation modules

pub mod movement;
pub mod server;
pub mod snapshot;
pub mod world;

pub use movement::EntityState;
pub use server::{GameServer, JoinReply, WorldCommand, WorldHandle};
pub use world::World;
