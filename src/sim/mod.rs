//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (60 Hz, velocities in pixels/frame)
//! - Seeded RNG only
//! - Stable update order (player, enemies, projectiles, collectibles)
//! - No rendering or platform dependencies

pub mod aabb;
pub mod body;
pub mod entity;
pub mod state;
pub mod tick;
pub mod tilemap;

pub use aabb::Aabb;
pub use body::{Body, CollisionFlags, GravityParams};
pub use entity::{
    Collectible, CollectibleKind, Enemy, EnemyKind, FallState, Player, Projectile, StableId,
    draw_stable_id,
};
pub use state::{LevelSession, SessionError, SessionPhase, SessionReport, Sprite, SpriteKey};
pub use tick::{TickInput, tick};
pub use tilemap::{LevelError, OffgridTile, Tile, TileKind, TileMap};
