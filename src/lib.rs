//! Hare Higher - simulation core for a 2D tile-grid platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tile grid, physics, entities, session)
//! - `tuning`: Data-driven gameplay tuning, validated at construction
//! - `progress`: Per-level completion and best-score records
//!
//! Rendering, input devices, menus, and audio are external collaborators:
//! the core consumes a per-frame [`sim::TickInput`] intent vector and
//! exposes sprite snapshots and end-of-level reports.

pub mod progress;
pub mod sim;
pub mod tuning;

pub use progress::Progress;
pub use tuning::{ContactOutcome, Tuning};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matching the authored physics)
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    /// Default tile edge length in pixels
    pub const DEFAULT_TILE_SIZE: i32 = 16;

    /// Gravity per frame (pixels/frame^2)
    pub const FALL_ACCEL: f32 = 0.1;
    /// Terminal fall speed (pixels/frame)
    pub const MAX_FALL_SPEED: f32 = 5.0;

    /// Charged-jump impulse floor (magnitude, pixels/frame)
    pub const JUMP_IMPULSE_MIN: f32 = 2.5;
    /// Charged-jump impulse ceiling (magnitude, pixels/frame)
    pub const JUMP_IMPULSE_MAX: f32 = 10.0;
    /// Charge accumulated per held frame
    pub const JUMP_CHARGE_RATE: f32 = 0.1;

    /// Grace window after leaving ground during which a jump still counts
    pub const COYOTE_TIME: f32 = 0.25;

    /// Player horizontal speed while a direction is held (pixels/frame)
    pub const MOVE_SPEED: f32 = 3.0;

    /// Logical view size used for camera centering
    pub const VIEW_WIDTH: f32 = 320.0;
    pub const VIEW_HEIGHT: f32 = 240.0;
    /// Camera easing divisor (scroll moves 1/N of the error per frame)
    pub const SCROLL_EASE: f32 = 30.0;
}
