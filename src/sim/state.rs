//! Level session state
//!
//! A [`LevelSession`] owns the active tile grid, the entity collections,
//! the camera scroll, and the score counters. Construction consumes the
//! level-authoring markers (spawner/collectible tiles) into live entities;
//! a reset is a full re-initialization from a pristine copy of the map,
//! never a partial rollback.

use std::collections::HashSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::{
    Collectible, CollectibleKind, Enemy, EnemyKind, Player, Projectile, StableId, draw_stable_id,
};
use super::tilemap::{LevelError, TileKind, TileMap};
use crate::tuning::{ConfigError, Tuning};

/// Spawner tile variants
const SPAWN_PLAYER: i32 = 0;
const SPAWN_PATROL: i32 = 1;
const SPAWN_THROWER: i32 = 2;
const SPAWN_BURROWER: i32 = 3;

/// Collectible tile variants
const PICKUP_CARROT: i32 = 0;
const PICKUP_RADISH: i32 = 1;
const PICKUP_FINISH: i32 = 2;

/// Where the run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Active gameplay
    Playing,
    /// Finish marker reached
    Complete,
    /// Hostile contact under the `ResetLevel` outcome; owner should reset
    Failed,
}

/// End-of-level tuple handed to the save/progress collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub carrots: u32,
    pub radishes: u32,
    pub elapsed_seconds: f32,
    pub completed: bool,
}

/// Which image set a sprite draws from; the renderer owns the actual handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKey {
    Player,
    Enemy(EnemyKind),
    Projectile,
    Collectible(CollectibleKind),
}

/// One drawable entity snapshot
#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    pub key: SpriteKey,
    /// Animation frame index derived from the entity's animation clock
    pub frame: u32,
    pub pos: Vec2,
    pub size: Vec2,
    pub flip: bool,
}

/// Animation rate for frame derivation (frames of animation per second)
const ANIM_FPS: f32 = 8.0;

/// Failures constructing a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// One level's live simulation state
#[derive(Debug, Clone)]
pub struct LevelSession {
    pub(crate) map: TileMap,
    /// Untouched copy of the loaded map, markers included, for resets
    pristine: TileMap,
    pub(crate) tuning: Tuning,
    seed: u64,
    rng: Pcg32,

    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub collectibles: Vec<Collectible>,
    pub projectiles: Vec<Projectile>,
    enemy_ids: HashSet<StableId>,
    projectile_ids: HashSet<StableId>,
    /// Projectiles marked during the frame, drained once at frame end
    doomed_projectiles: Vec<StableId>,

    pub scroll: Vec2,
    pub carrots: u32,
    pub radishes: u32,
    elapsed: f32,
    phase: SessionPhase,
}

impl LevelSession {
    pub fn new(mut map: TileMap, tuning: Tuning, seed: u64) -> Result<Self, SessionError> {
        tuning.validate()?;
        map.set_solid_kinds(&tuning.solid_kinds);
        let pristine = map.clone();
        let mut rng = Pcg32::seed_from_u64(seed);

        let mut session = Self {
            map,
            pristine,
            tuning,
            seed,
            player: Player::new(Vec2::ZERO, Vec2::ZERO),
            enemies: Vec::new(),
            collectibles: Vec::new(),
            projectiles: Vec::new(),
            enemy_ids: HashSet::new(),
            projectile_ids: HashSet::new(),
            doomed_projectiles: Vec::new(),
            scroll: Vec2::ZERO,
            carrots: 0,
            radishes: 0,
            elapsed: 0.0,
            phase: SessionPhase::Playing,
            rng: Pcg32::seed_from_u64(seed),
        };
        session.populate(&mut rng)?;
        session.rng = rng;
        log::info!(
            "session ready: {} enemies, {} collectibles",
            session.enemies.len(),
            session.collectibles.len()
        );
        Ok(session)
    }

    /// Consume the authoring markers in `self.map` into live entities
    fn populate(&mut self, rng: &mut Pcg32) -> Result<(), SessionError> {
        let ts = self.map.tile_size() as f32;
        let entity_size = Vec2::splat(ts);
        let pickup_size = Vec2::splat(ts / 2.0);

        let spawners = self.map.extract(
            &[
                (TileKind::Spawner, SPAWN_PLAYER),
                (TileKind::Spawner, SPAWN_PATROL),
                (TileKind::Spawner, SPAWN_THROWER),
                (TileKind::Spawner, SPAWN_BURROWER),
            ],
            false,
        );

        let mut player_pos = None;
        for marker in &spawners {
            match marker.variant {
                SPAWN_PLAYER => {
                    if player_pos.is_some() {
                        log::warn!("multiple player spawners; using the first");
                    } else {
                        player_pos = Some(marker.pos);
                    }
                }
                SPAWN_PATROL | SPAWN_THROWER | SPAWN_BURROWER => {
                    let (kind, pos) = match marker.variant {
                        SPAWN_PATROL => (EnemyKind::Patrol, marker.pos),
                        SPAWN_THROWER => (EnemyKind::Thrower, marker.pos),
                        // Burrowers sit slightly above their nominal tile
                        _ => (EnemyKind::Burrower, marker.pos - Vec2::new(0.0, ts / 4.0)),
                    };
                    let id = draw_stable_id(rng, &self.enemy_ids);
                    self.enemy_ids.insert(id.clone());
                    self.enemies
                        .push(Enemy::new(id, kind, pos, entity_size, self.tuning.patrol_speed));
                }
                _ => {}
            }
        }
        let player_pos = player_pos.ok_or(LevelError::MissingPlayerSpawn)?;
        self.player = Player::new(player_pos, entity_size);

        for marker in self.map.extract(
            &[
                (TileKind::Collectible, PICKUP_CARROT),
                (TileKind::Collectible, PICKUP_RADISH),
                (TileKind::Collectible, PICKUP_FINISH),
            ],
            false,
        ) {
            let kind = match marker.variant {
                PICKUP_CARROT => CollectibleKind::Carrot,
                PICKUP_RADISH => CollectibleKind::Radish,
                _ => CollectibleKind::FinishMarker,
            };
            self.collectibles
                .push(Collectible::new(kind, marker.pos, pickup_size));
        }

        Ok(())
    }

    /// Full re-initialization of all mutable state from the pristine map
    pub fn reset(&mut self) -> Result<(), SessionError> {
        log::info!("resetting level session");
        self.map = self.pristine.clone();
        self.enemies.clear();
        self.collectibles.clear();
        self.projectiles.clear();
        self.enemy_ids.clear();
        self.projectile_ids.clear();
        self.doomed_projectiles.clear();
        self.scroll = Vec2::ZERO;
        self.carrots = 0;
        self.radishes = 0;
        self.elapsed = 0.0;
        self.phase = SessionPhase::Playing;
        let mut rng = Pcg32::seed_from_u64(self.seed);
        self.populate(&mut rng)?;
        self.rng = rng;
        Ok(())
    }

    #[inline]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub(crate) fn advance_clock(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    /// Grid access for the level editor; gameplay never mutates tiles
    pub fn map_mut(&mut self) -> &mut TileMap {
        &mut self.map
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn projectile_ids(&self) -> &HashSet<StableId> {
        &self.projectile_ids
    }

    pub fn enemy_ids(&self) -> &HashSet<StableId> {
        &self.enemy_ids
    }

    /// Spawn a projectile aimed with the captured offset to the player
    pub(crate) fn spawn_projectile(&mut self, pos: Vec2, offset_to_player: Vec2) {
        let ts = self.map.tile_size() as f32;
        let id = draw_stable_id(&mut self.rng, &self.projectile_ids);
        self.projectile_ids.insert(id.clone());
        self.projectiles.push(Projectile::new(
            id,
            pos,
            Vec2::splat(ts * 0.375),
            offset_to_player,
            &self.tuning,
        ));
    }

    /// Mark a projectile for end-of-frame removal. The projectile stays in
    /// the collection (and id set) until [`LevelSession::flush_removals`].
    pub(crate) fn mark_projectile_dead(&mut self, id: StableId) {
        if !self.doomed_projectiles.contains(&id) {
            self.doomed_projectiles.push(id);
        }
    }

    /// Drain the to-delete list. Called exactly once, after every entity
    /// has updated, so the live collection is never mutated mid-iteration.
    pub(crate) fn flush_removals(&mut self) {
        if self.doomed_projectiles.is_empty() {
            return;
        }
        for id in &self.doomed_projectiles {
            self.projectile_ids.remove(id);
        }
        let doomed = std::mem::take(&mut self.doomed_projectiles);
        self.projectiles.retain(|p| !doomed.contains(&p.id));
    }

    /// The end-of-level tuple the progress collaborator persists
    pub fn report(&self) -> SessionReport {
        SessionReport {
            carrots: self.carrots,
            radishes: self.radishes,
            elapsed_seconds: self.elapsed,
            completed: self.phase == SessionPhase::Complete,
        }
    }

    /// Drawable snapshot of every live entity, in draw order
    pub fn sprites(&self) -> Vec<Sprite> {
        let frame = |clock: f32| (clock * ANIM_FPS) as u32;
        let mut sprites = Vec::with_capacity(
            1 + self.enemies.len() + self.projectiles.len() + self.collectibles.len(),
        );
        for c in &self.collectibles {
            sprites.push(Sprite {
                key: SpriteKey::Collectible(c.kind),
                frame: frame(c.body.anim_clock),
                pos: c.render_pos(&self.tuning),
                size: c.body.size(),
                flip: false,
            });
        }
        for e in &self.enemies {
            sprites.push(Sprite {
                key: SpriteKey::Enemy(e.kind),
                frame: frame(e.body.anim_clock),
                pos: e.body.pos,
                size: e.body.size(),
                flip: e.body.flip,
            });
        }
        for p in &self.projectiles {
            sprites.push(Sprite {
                key: SpriteKey::Projectile,
                frame: frame(p.body.anim_clock),
                pos: p.body.pos,
                size: p.body.size(),
                flip: p.body.flip,
            });
        }
        sprites.push(Sprite {
            key: SpriteKey::Player,
            frame: frame(self.player.body.anim_clock),
            pos: self.player.body.pos,
            size: self.player.body.size(),
            flip: self.player.body.flip,
        });
        sprites
    }

    #[cfg(test)]
    pub(crate) fn doomed_len(&self) -> usize {
        self.doomed_projectiles.len()
    }
}
