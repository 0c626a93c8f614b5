//! Entity kinds built on top of [`Body`]
//!
//! One shared physics-body component plus per-kind behavior, instead of an
//! inheritance chain: the player owns its jump state machine, enemies carry
//! a kind tag dispatched in the tick, projectiles are ballistic, and
//! collectibles only bob and wait to be overlapped.

use glam::{IVec2, Vec2};
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::body::Body;
use super::tilemap::TileMap;
use crate::consts::FRAME_DT;
use crate::tuning::Tuning;

/// Identifier for live enemies/projectiles: 8 symbols from a 16-symbol
/// alphabet, unique among live entities of its collection at any instant.
pub type StableId = String;

const ID_ALPHABET: &[u8; 16] = b"0123456789abcdef";
const ID_LEN: usize = 8;

/// Draw a stable id not currently in use. Collisions are recovered locally
/// by redrawing; they are never surfaced.
pub fn draw_stable_id(rng: &mut Pcg32, in_use: &HashSet<StableId>) -> StableId {
    loop {
        let id: String = (0..ID_LEN)
            .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
            .collect();
        if !in_use.contains(&id) {
            return id;
        }
        log::warn!("stable id collision on {id}, redrawing");
    }
}

// ---------------------------------------------------------------------------
// Player

/// The player: body plus the jump state machine. Grounded/airborne is
/// tracked implicitly through `jumps` and `air_time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    /// 1 while a jump is available (on ground or within coyote time), else 0
    jumps: u8,
    /// Seconds since the player last stood on ground
    air_time: f32,
    /// Stored vertical impulse accumulated while the jump key is held
    /// (negative = upward). Owned here, not module state: reset on reload.
    charge: f32,
}

impl Player {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            body: Body::new(pos, size),
            jumps: 1,
            air_time: 0.0,
            charge: 0.0,
        }
    }

    pub fn air_time(&self) -> f32 {
        self.air_time
    }

    pub fn jumps_remaining(&self) -> u8 {
        self.jumps
    }

    pub fn charge(&self) -> f32 {
        self.charge
    }

    /// Advance one frame from discrete input intent.
    /// `move_dir` is -1/0/+1, `jump_held`/`jump_released` come straight from
    /// the input collaborator.
    pub fn update(
        &mut self,
        map: &TileMap,
        move_dir: f32,
        jump_held: bool,
        jump_released: bool,
        tuning: &Tuning,
    ) {
        let movement = Vec2::new(move_dir * tuning.move_speed, 0.0);
        let charging = jump_held && self.charge != 0.0;
        self.body.update(
            map,
            movement,
            &tuning.player_gravity,
            charging,
            tuning.ground_check_requires_descent,
        );

        if self
            .body
            .grounded(map, tuning.ground_check_requires_descent)
        {
            self.air_time = 0.0;
            self.jumps = 1;
        } else {
            self.air_time += FRAME_DT;
            // Coyote time spent: the grace jump is gone
            if self.air_time > tuning.coyote_time {
                self.jumps = 0;
            }
        }

        if jump_held {
            // Grow the stored impulse from the floor toward the ceiling
            self.charge = (self.charge.min(-tuning.jump_impulse_min)
                - tuning.jump_charge_rate)
                .max(-tuning.jump_impulse_max);
        }

        if jump_released {
            if self.jumps > 0 {
                // Apply the whole accumulated impulse in one step; an
                // instant release still launches at the configured floor
                let impulse = self
                    .charge
                    .clamp(-tuning.jump_impulse_max, -tuning.jump_impulse_min);
                self.body.vel.y += impulse;
                self.jumps = 0;
            }
            // Released with no jump left: the charge is simply discarded
            self.charge = 0.0;
        }
    }
}

// ---------------------------------------------------------------------------
// Enemies

/// Behavior tag for an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Walks a platform, turning at ledges, walls, and other patrollers
    Patrol,
    /// Stationary; lobs projectiles at the player within range
    Thrower,
    /// Stationary hazard that launches the player upward on contact
    Burrower,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: StableId,
    pub kind: EnemyKind,
    pub body: Body,
    /// Seconds since the last throw (Thrower only)
    pub throw_timer: f32,
}

impl Enemy {
    pub fn new(id: StableId, kind: EnemyKind, pos: Vec2, size: Vec2, patrol_speed: f32) -> Self {
        let mut body = Body::new(pos, size);
        if kind == EnemyKind::Patrol {
            body.vel.x = patrol_speed;
        }
        // Start a thrower ready to fire
        let throw_timer = f32::MAX;
        Self {
            id,
            kind,
            body,
            throw_timer,
        }
    }

    /// Terrain-only part of the per-frame update. Cross-entity behavior
    /// (separation, throwing, contact) happens in the tick, which can see
    /// the other collections.
    pub fn update_terrain(&mut self, map: &TileMap, tuning: &Tuning) {
        match self.kind {
            EnemyKind::Patrol => {
                let dir = if self.body.vel.x >= 0.0 { 1 } else { -1 };
                let probe = self.body.rect().center();
                // About to step off a ledge, or walking into a wall
                let ahead_below = map.specific_rect(probe, IVec2::new(dir, 1));
                let ahead = map.specific_rect(probe, IVec2::new(dir, 0));
                if ahead_below.is_null() || !ahead.is_null() {
                    self.body.vel.x = -self.body.vel.x;
                }
                self.body.update(
                    map,
                    Vec2::ZERO,
                    &tuning.enemy_gravity,
                    false,
                    tuning.ground_check_requires_descent,
                );
            }
            EnemyKind::Thrower => {
                self.body.update(
                    map,
                    Vec2::ZERO,
                    &tuning.enemy_gravity,
                    false,
                    tuning.ground_check_requires_descent,
                );
            }
            // Sits slightly above its tile and never moves; only its
            // animation clock advances
            EnemyKind::Burrower => {
                self.body.anim_clock += FRAME_DT;
            }
        }
    }

    /// Reverse patrol direction (ledge/wall/peer bounce)
    pub fn reverse(&mut self) {
        self.body.vel.x = -self.body.vel.x;
    }
}

// ---------------------------------------------------------------------------
// Projectiles

/// Which half of its arc a projectile is on (drives the sprite)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallState {
    Rising,
    Falling,
}

/// A lobbed projectile. Not homing: the launch velocity is derived once
/// from where the player stood at spawn time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: StableId,
    pub body: Body,
    /// Offset from thrower to player, captured at creation
    pub origin_offset: Vec2,
    pub falling: FallState,
}

impl Projectile {
    pub fn new(id: StableId, pos: Vec2, size: Vec2, offset_to_player: Vec2, tuning: &Tuning) -> Self {
        let mut body = Body::new(pos, size);
        // Ballistic arc toward the captured offset, with a fixed upward
        // bias so the throw lobs instead of beelining
        body.vel = Vec2::new(
            offset_to_player.x * tuning.throw_speed_factor,
            offset_to_player.y * tuning.throw_speed_factor - tuning.throw_lob_bias,
        );
        Self {
            id,
            body,
            origin_offset: offset_to_player,
            falling: FallState::Rising,
        }
    }

    pub fn update(&mut self, map: &TileMap, tuning: &Tuning) {
        self.body.update(
            map,
            Vec2::ZERO,
            &tuning.projectile_gravity,
            false,
            tuning.ground_check_requires_descent,
        );
        self.falling = if self.body.vel.y > 0.0 {
            FallState::Falling
        } else {
            FallState::Rising
        };
    }
}

// ---------------------------------------------------------------------------
// Collectibles

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectibleKind {
    Carrot,
    Radish,
    /// Touching this ends the level
    FinishMarker,
}

/// A pickup waiting for the player to overlap it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub kind: CollectibleKind,
    pub body: Body,
    /// Drives the sine bob
    bob_clock: f32,
    /// Anchor y for the bob when the hitbox stays fixed
    base_y: f32,
}

impl Collectible {
    pub fn new(kind: CollectibleKind, pos: Vec2, size: Vec2) -> Self {
        Self {
            kind,
            body: Body::new(pos, size),
            bob_clock: 0.0,
            base_y: pos.y,
        }
    }

    /// Advance the cosmetic bob. When `bob_moves_hitbox` is set the drift
    /// is applied to the body position itself, otherwise the body stays
    /// anchored and only [`Collectible::render_pos`] bobs.
    pub fn update(&mut self, tuning: &Tuning) {
        self.bob_clock += FRAME_DT;
        if tuning.bob_moves_hitbox {
            self.body.pos.y += tuning.bob_amplitude * self.bob_clock.sin();
        }
        self.body.anim_clock += FRAME_DT;
    }

    /// Position to draw at, always including the bob
    pub fn render_pos(&self, tuning: &Tuning) -> Vec2 {
        if tuning.bob_moves_hitbox {
            self.body.pos
        } else {
            Vec2::new(
                self.body.pos.x,
                self.base_y + tuning.bob_amplitude * self.bob_clock.sin(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_stable_id_shape() {
        let mut rng = Pcg32::seed_from_u64(7);
        let id = draw_stable_id(&mut rng, &HashSet::new());
        assert_eq!(id.len(), 8);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_stable_id_redraws_until_unique() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut in_use = HashSet::new();
        // Force a collision: pre-insert the exact id this seed draws first
        let first = draw_stable_id(&mut rng, &in_use);
        let mut rng = Pcg32::seed_from_u64(7);
        in_use.insert(first.clone());
        let second = draw_stable_id(&mut rng, &in_use);
        assert_ne!(first, second);
        assert!(!in_use.contains(&second));
    }

    #[test]
    fn test_stable_ids_pairwise_distinct() {
        let mut rng = Pcg32::seed_from_u64(99);
        let mut in_use: HashSet<StableId> = HashSet::new();
        for _ in 0..256 {
            let id = draw_stable_id(&mut rng, &in_use);
            assert!(in_use.insert(id));
        }
        assert_eq!(in_use.len(), 256);
    }

    #[test]
    fn test_collectible_bob_modes() {
        let mut tuning = Tuning::default();

        tuning.bob_moves_hitbox = true;
        let mut moving = Collectible::new(
            CollectibleKind::Carrot,
            Vec2::new(10.0, 50.0),
            Vec2::splat(8.0),
        );
        for _ in 0..30 {
            moving.update(&tuning);
        }
        assert_ne!(moving.body.pos.y, 50.0);
        assert_eq!(moving.render_pos(&tuning), moving.body.pos);

        tuning.bob_moves_hitbox = false;
        let mut anchored = Collectible::new(
            CollectibleKind::Carrot,
            Vec2::new(10.0, 50.0),
            Vec2::splat(8.0),
        );
        for _ in 0..30 {
            anchored.update(&tuning);
        }
        assert_eq!(anchored.body.pos.y, 50.0);
        assert_ne!(anchored.render_pos(&tuning).y, 50.0);
    }

    #[test]
    fn test_projectile_launch_is_arcing_lob() {
        let tuning = Tuning::default();
        let offset = Vec2::new(64.0, 0.0); // player level with the thrower
        let p = Projectile::new(
            "00000000".into(),
            Vec2::ZERO,
            Vec2::splat(6.0),
            offset,
            &tuning,
        );
        assert!(p.body.vel.x > 0.0);
        assert!(p.body.vel.y < 0.0); // upward bias
        assert_eq!(p.falling, FallState::Rising);
    }
}
