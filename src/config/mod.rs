//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// World simulation knobs
    pub world: WorldConfig,
}

/// Numeric knobs of the simulated world.
///
/// Shared verbatim between the authoritative simulation and the client
/// prediction path: both sides must integrate with identical constants.
#[derive(Clone, Copy, Debug)]
pub struct WorldConfig {
    /// Square map side length in pixels, world coordinates span [0, map_size]
    pub map_size: f32,
    /// Player hitbox radius
    pub player_radius: f32,
    /// Bullet hitbox radius
    pub bullet_radius: f32,
    /// Player movement speed in pixels per second
    pub player_speed: f32,
    /// Bullet speed in pixels per second
    pub bullet_speed: f32,
    /// Bullet lifetime in milliseconds
    pub bullet_ttl_ms: u64,
    /// Minimum delay between shots in milliseconds
    pub shot_cooldown_ms: u64,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Render-time offset for remote entity interpolation (milliseconds)
    pub interpolation_delay_ms: u64,
    /// How long interpolation samples are retained (milliseconds)
    pub interpolation_retention_ms: u64,
    /// Maximum unacknowledged predictions buffered per local entity
    pub pending_input_cap: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            map_size: 1000.0,
            player_radius: 25.0,
            bullet_radius: 5.0,
            player_speed: 300.0,
            bullet_speed: 600.0,
            bullet_ttl_ms: 5000,
            shot_cooldown_ms: 1000,
            tick_rate: 60,
            interpolation_delay_ms: 100,
            interpolation_retention_ms: 1000,
            pending_input_cap: 128,
        }
    }
}

impl WorldConfig {
    /// Fixed simulation step in seconds
    pub fn tick_delta(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Duration of one simulation tick
    pub fn tick_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.tick_rate as u64)
    }

    /// Distance a player covers for one move input
    pub fn move_step(&self) -> f32 {
        self.player_speed * self.tick_delta()
    }

    /// Load world knobs from NETARENA_* environment variables, keeping
    /// defaults for anything unset
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let cfg = Self {
            map_size: env_knob("NETARENA_MAP_SIZE", defaults.map_size)?,
            player_radius: env_knob("NETARENA_PLAYER_RADIUS", defaults.player_radius)?,
            bullet_radius: env_knob("NETARENA_BULLET_RADIUS", defaults.bullet_radius)?,
            player_speed: env_knob("NETARENA_PLAYER_SPEED", defaults.player_speed)?,
            bullet_speed: env_knob("NETARENA_BULLET_SPEED", defaults.bullet_speed)?,
            bullet_ttl_ms: env_knob("NETARENA_BULLET_TTL_MS", defaults.bullet_ttl_ms)?,
            shot_cooldown_ms: env_knob("NETARENA_SHOT_COOLDOWN_MS", defaults.shot_cooldown_ms)?,
            tick_rate: env_knob("NETARENA_TICK_RATE", defaults.tick_rate)?,
            interpolation_delay_ms: env_knob(
                "NETARENA_INTERP_DELAY_MS",
                defaults.interpolation_delay_ms,
            )?,
            interpolation_retention_ms: env_knob(
                "NETARENA_INTERP_RETENTION_MS",
                defaults.interpolation_retention_ms,
            )?,
            pending_input_cap: env_knob(
                "NETARENA_PENDING_INPUT_CAP",
                defaults.pending_input_cap,
            )?,
        };

        // Every per-tick derivation divides by the tick rate
        if cfg.tick_rate == 0 {
            return Err(ConfigError::InvalidNumber("NETARENA_TICK_RATE"));
        }

        Ok(cfg)
    }
}

/// Parse an optional environment variable, falling back to a default
fn env_knob<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber(name)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // PORT (provided by most PaaS hosts) wins over SERVER_ADDR
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            world: WorldConfig::from_env()?,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid numeric value for environment variable: {0}")]
    InvalidNumber(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
