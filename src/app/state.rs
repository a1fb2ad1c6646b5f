//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{GameServer, WorldHandle};
use crate::session::SessionRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub world: WorldHandle,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Build the state and the world task (the caller spawns the task)
    pub fn new(config: Config) -> (Self, GameServer) {
        let config = Arc::new(config);

        let seed: u64 = rand::random();
        let (server, world) = GameServer::new(config.world, seed);

        let state = Self {
            config,
            world,
            sessions: Arc::new(SessionRegistry::new()),
        };

        (state, server)
    }
}
