//! Physics body and tile collision resolution
//!
//! Movement is resolved one axis at a time: X fully, then Y. Resolving a
//! single combined displacement catches corners and tunnels through tile
//! seams; the axis-separated order keeps entities sliding cleanly along
//! walls and floors.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::tilemap::TileMap;
use crate::consts::{FALL_ACCEL, FRAME_DT, MAX_FALL_SPEED};

/// Which sides of the body touched a solid tile this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl CollisionFlags {
    fn clear(&mut self) {
        *self = Self::default();
    }

    /// True if any side touched a solid tile
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// Gravity tuning for one body class. Projectiles use a tuple without
/// slow-descent damping; the player's tuple honors the jump charge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GravityParams {
    /// Added to vertical velocity each airborne frame (pixels/frame^2)
    pub fall_accel: f32,
    /// Terminal fall speed (pixels/frame)
    pub max_fall_speed: f32,
    /// Multiplier on `fall_accel` while a held jump charge slows descent
    pub slow_descent_factor: f32,
}

impl Default for GravityParams {
    fn default() -> Self {
        Self {
            fall_accel: FALL_ACCEL,
            max_fall_speed: MAX_FALL_SPEED,
            slow_descent_factor: 0.5,
        }
    }
}

/// Per-entity position/velocity/collision state. Every dynamic entity owns
/// one; the tile grid never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    /// Top-left of the bounding box, pixels
    pub pos: Vec2,
    /// Fixed for the body's lifetime
    size: Vec2,
    /// Pixels per frame
    pub vel: Vec2,
    pub flags: CollisionFlags,
    /// Facing left when true; holds its last value while standing still
    pub flip: bool,
    /// Animation clock in seconds (cosmetic, advanced once per update)
    pub anim_clock: f32,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            vel: Vec2::ZERO,
            flags: CollisionFlags::default(),
            flip: false,
            anim_clock: 0.0,
        }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    /// Advance one frame: resolve `movement + vel` against the grid axis by
    /// axis, then apply gravity and the normal force.
    ///
    /// `movement` is the externally-driven displacement for this frame
    /// (input intent for the player, zero for ballistic bodies);
    /// `slow_descent` dampens gravity while a jump charge is held;
    /// `ground_gate` is the optional `vel.y >= 0` requirement on the ground
    /// probe (see [`Body::grounded`]).
    pub fn update(
        &mut self,
        map: &TileMap,
        movement: Vec2,
        gravity: &GravityParams,
        slow_descent: bool,
        ground_gate: bool,
    ) {
        self.flags.clear();

        let frame = movement + self.vel;

        // Horizontal pass
        self.pos.x += frame.x;
        let mut rect = self.rect();
        for solid in map.solid_rects_near(self.pos) {
            if rect.intersects(&solid) {
                if frame.x > 0.0 {
                    rect.set_right(solid.left());
                    self.flags.right = true;
                }
                if frame.x < 0.0 {
                    rect.set_left(solid.right());
                    self.flags.left = true;
                }
                self.pos.x = rect.pos.x;
            }
        }

        // Vertical pass, against the already-corrected X position
        self.pos.y += frame.y;
        let mut rect = self.rect();
        for solid in map.solid_rects_near(self.pos) {
            if rect.intersects(&solid) {
                if frame.y > 0.0 {
                    rect.set_bottom(solid.top());
                    self.flags.down = true;
                }
                if frame.y < 0.0 {
                    rect.set_top(solid.bottom());
                    self.flags.up = true;
                }
                self.pos.y = rect.pos.y;
            }
        }

        // Gravity while airborne, damped under a held jump charge
        if !self.grounded(map, ground_gate) {
            let accel = if slow_descent {
                gravity.fall_accel * gravity.slow_descent_factor
            } else {
                gravity.fall_accel
            };
            self.vel.y = gravity.max_fall_speed.min(self.vel.y + accel);
        }

        // Normal force: landing or a head bonk cancels vertical velocity
        if self.flags.down || self.flags.up {
            self.vel.y = 0.0;
        }

        // Facing follows the sign of this frame's horizontal motion
        if frame.x > 0.0 {
            self.flip = false;
        }
        if frame.x < 0.0 {
            self.flip = true;
        }

        self.anim_clock += FRAME_DT;
    }

    /// Ground probe: a 1-pixel-lower copy of the bounding box tested against
    /// the solid tiles below. Pure - no counters move, so repeated calls in
    /// one frame agree.
    ///
    /// With `require_descent` the probe also demands `vel.y >= 0`, which
    /// avoids a false "grounded" while still moving up through a tile edge.
    pub fn grounded(&self, map: &TileMap, require_descent: bool) -> bool {
        if require_descent && self.vel.y < 0.0 {
            return false;
        }
        let mut probe = self.rect();
        probe.pos.y += 1.0;
        map.solid_rects_near(self.pos)
            .iter()
            .any(|solid| probe.intersects(solid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tilemap::{Tile, TileKind};
    use glam::IVec2;
    use proptest::prelude::*;

    /// A floor at grid row 4 (pixels 64..80) spanning columns -2..=8,
    /// with a wall column at grid x=6.
    fn test_map() -> TileMap {
        let mut map = TileMap::new(16).unwrap();
        for x in -2..=8 {
            map.set_tile(Tile {
                kind: TileKind::Solid,
                variant: 0,
                rotation: 0,
                pos: IVec2::new(x, 4),
            });
        }
        for y in 0..4 {
            map.set_tile(Tile {
                kind: TileKind::Solid,
                variant: 0,
                rotation: 0,
                pos: IVec2::new(6, y),
            });
        }
        map
    }

    fn overlaps_any_solid(body: &Body, map: &TileMap) -> bool {
        let rect = body.rect();
        map.solid_rects_near(body.pos)
            .iter()
            .any(|solid| rect.intersects(solid))
    }

    #[test]
    fn test_falls_and_lands() {
        let map = test_map();
        let mut body = Body::new(Vec2::new(16.0, 40.0), Vec2::new(10.0, 10.0));
        let gravity = GravityParams::default();
        for _ in 0..600 {
            body.update(&map, Vec2::ZERO, &gravity, false, true);
        }
        // Resting exactly on top of the floor at y=64
        assert_eq!(body.rect().bottom(), 64.0);
        assert_eq!(body.vel.y, 0.0);
        assert!(body.grounded(&map, true));
    }

    #[test]
    fn test_landing_frame_sets_down_flag() {
        let map = test_map();
        let mut body = Body::new(Vec2::new(16.0, 53.0), Vec2::new(10.0, 10.0));
        body.vel.y = 2.0;
        body.update(&map, Vec2::ZERO, &GravityParams::default(), false, true);
        assert!(body.flags.down);
        assert_eq!(body.rect().bottom(), 64.0);
        assert_eq!(body.vel.y, 0.0);
    }

    #[test]
    fn test_wall_stops_horizontal_motion() {
        let map = test_map();
        let mut body = Body::new(Vec2::new(80.0, 48.0), Vec2::new(10.0, 10.0));
        body.vel.x = 12.0;
        let gravity = GravityParams::default();
        body.update(&map, Vec2::ZERO, &gravity, false, true);
        // Wall column at x=6 starts at pixel 96
        assert_eq!(body.rect().right(), 96.0);
        assert!(body.flags.right);
    }

    #[test]
    fn test_head_bonk_zeroes_velocity() {
        let mut map = TileMap::new(16).unwrap();
        map.set_tile(Tile {
            kind: TileKind::Solid,
            variant: 0,
            rotation: 0,
            pos: IVec2::new(0, 0),
        });
        let mut body = Body::new(Vec2::new(3.0, 20.0), Vec2::new(10.0, 10.0));
        body.vel.y = -8.0;
        body.update(&map, Vec2::ZERO, &GravityParams::default(), false, true);
        assert!(body.flags.up);
        assert_eq!(body.rect().top(), 16.0);
        assert_eq!(body.vel.y, 0.0);
    }

    #[test]
    fn test_gravity_clamps_at_terminal_speed() {
        let map = TileMap::new(16).unwrap(); // empty: free fall forever
        let mut body = Body::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let gravity = GravityParams::default();
        for _ in 0..200 {
            body.update(&map, Vec2::ZERO, &gravity, false, true);
        }
        assert_eq!(body.vel.y, gravity.max_fall_speed);
    }

    #[test]
    fn test_slow_descent_dampens_gravity() {
        let map = TileMap::new(16).unwrap();
        let gravity = GravityParams::default();

        let mut free = Body::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let mut damped = free.clone();
        for _ in 0..10 {
            free.update(&map, Vec2::ZERO, &gravity, false, true);
            damped.update(&map, Vec2::ZERO, &gravity, true, true);
        }
        assert!(damped.vel.y < free.vel.y);
        assert!(damped.vel.y > 0.0);
    }

    #[test]
    fn test_facing_persists_when_still() {
        let map = TileMap::new(16).unwrap();
        let mut body = Body::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let gravity = GravityParams::default();
        body.update(&map, Vec2::new(-3.0, 0.0), &gravity, false, true);
        assert!(body.flip);
        body.update(&map, Vec2::new(0.0, 0.0), &gravity, false, true);
        assert!(body.flip); // unchanged at zero horizontal motion
    }

    #[test]
    fn test_ground_probe_idempotent() {
        let map = test_map();
        let body = Body::new(Vec2::new(16.0, 54.0), Vec2::new(10.0, 10.0));
        for gate in [true, false] {
            let first = body.grounded(&map, gate);
            let second = body.grounded(&map, gate);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_ground_gate_rejects_upward_motion() {
        let map = test_map();
        // Touching the floor but moving upward
        let mut body = Body::new(Vec2::new(16.0, 54.0), Vec2::new(10.0, 10.0));
        body.vel.y = -2.0;
        assert!(!body.grounded(&map, true));
        assert!(body.grounded(&map, false));
    }

    proptest! {
        /// No tunneling: with per-axis speed at most one tile, a body never
        /// ends a frame overlapping a solid tile's interior.
        #[test]
        fn prop_no_tunneling(
            px in -24.0f32..120.0,
            py in 0.0f32..62.0,
            vx in -16.0f32..16.0,
            vy in -16.0f32..16.0,
            gate in proptest::bool::ANY,
        ) {
            let map = test_map();
            let mut body = Body::new(Vec2::new(px, py), Vec2::new(10.0, 10.0));
            // Skip starts that already intersect terrain
            prop_assume!(!overlaps_any_solid(&body, &map));
            body.vel = Vec2::new(vx, vy);
            body.update(&map, Vec2::ZERO, &GravityParams::default(), false, gate);
            prop_assert!(!overlaps_any_solid(&body, &map));
        }
    }
}
