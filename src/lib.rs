//! netarena - authoritative state synchronization for a multiplayer 2D
//! arena shooter.
//!
//! The server half ([`game`], [`ws`], [`http`]) simulates the shared world
//! at a fixed tick rate and broadcasts per-tick deltas over WebSocket. The
//! client half ([`client`]) predicts the local entity, reconciles it against
//! authoritative corrections, and renders remote entities through
//! time-delayed interpolation. Both halves integrate movement with the same
//! routine in [`game::movement`]; keeping that identity is the load-bearing
//! correctness property of the whole scheme.

pub mod app;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod session;
pub mod util;
pub mod ws;
