//! Fixed timestep frame advance
//!
//! One tick moves every entity exactly once, in a fixed order: player,
//! enemies, projectiles, collectibles. Later entities read the current
//! frame's already-updated positions of earlier ones. Collections are only
//! mutated after all updates ran (deferred deletion), never mid-iteration.

use glam::Vec2;

use super::aabb::Aabb;
use super::entity::{CollectibleKind, EnemyKind, StableId};
use super::state::{LevelSession, SessionPhase};
use crate::consts::{FRAME_DT, SCROLL_EASE};
use crate::tuning::ContactOutcome;

/// Discrete input intent for one frame. The core never reads input devices;
/// the platform collaborator fills this in.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    /// Jump key currently held (accumulates the charge)
    pub jump_held: bool,
    /// Jump key went up this frame (releases the charge)
    pub jump_released: bool,
}

/// Advance the session by one fixed 60 Hz frame
pub fn tick(state: &mut LevelSession, input: &TickInput) {
    if state.phase() != SessionPhase::Playing {
        return;
    }
    state.advance_clock(FRAME_DT);

    // Camera eases toward centering the player
    let target = state.player.body.rect().center() - state.tuning.view_size / 2.0;
    state.scroll += (target - state.scroll) / SCROLL_EASE;

    // --- Player ---
    let move_dir = (input.move_right as i32 - input.move_left as i32) as f32;
    state.player.update(
        &state.map,
        move_dir,
        input.jump_held,
        input.jump_released,
        &state.tuning,
    );
    let player_rect = state.player.body.rect();
    let player_center = player_rect.center();

    // --- Enemies ---
    for enemy in &mut state.enemies {
        enemy.update_terrain(&state.map, &state.tuning);
    }

    // Patrol separation reads a snapshot of post-move rectangles
    let patrol_rects: Vec<(StableId, Aabb)> = state
        .enemies
        .iter()
        .filter(|e| e.kind == EnemyKind::Patrol)
        .map(|e| (e.id.clone(), e.body.rect()))
        .collect();

    let mut failed = false;
    let mut burrow_hit = false;
    let mut throws: Vec<(Vec2, Vec2)> = Vec::new();

    for enemy in &mut state.enemies {
        match enemy.kind {
            EnemyKind::Patrol => {
                let rect = enemy.body.rect();
                let bumped = patrol_rects
                    .iter()
                    .any(|(id, other)| *id != enemy.id && rect.intersects(other));
                if bumped {
                    enemy.reverse();
                }
                if rect.intersects(&player_rect) {
                    match state.tuning.contact_outcome {
                        ContactOutcome::Ignore => {
                            log::debug!("patrol {} brushed the player", enemy.id)
                        }
                        ContactOutcome::ResetLevel => failed = true,
                    }
                }
            }
            EnemyKind::Thrower => {
                let origin = enemy.body.rect().center();
                let offset = player_center - origin;
                if offset.length() <= state.tuning.throw_radius
                    && enemy.throw_timer >= state.tuning.throw_cooldown
                {
                    throws.push((origin, offset));
                    enemy.throw_timer = 0.0;
                } else {
                    enemy.throw_timer += FRAME_DT;
                }
            }
            EnemyKind::Burrower => {
                // Non-fatal hazard: launches the player instead of resetting
                if enemy.body.rect().intersects(&player_rect) {
                    burrow_hit = true;
                }
            }
        }
    }

    if burrow_hit {
        state.player.body.vel.y = -state.tuning.burrow_launch;
    }
    for (origin, offset) in throws {
        state.spawn_projectile(origin, offset);
    }

    // --- Projectiles ---
    // Snapshot enemy rects so a projectile can die on a non-thrower
    let enemy_rects: Vec<(EnemyKind, Aabb)> = state
        .enemies
        .iter()
        .map(|e| (e.kind, e.body.rect()))
        .collect();

    let mut doomed: Vec<StableId> = Vec::new();
    let mut player_struck = false;
    for projectile in &mut state.projectiles {
        projectile.update(&state.map, &state.tuning);
        let rect = projectile.body.rect();

        let hit_tile = projectile.body.flags.any();
        let hit_player = rect.intersects(&player_rect);
        let hit_enemy = enemy_rects
            .iter()
            .any(|(kind, other)| *kind != EnemyKind::Thrower && rect.intersects(other));

        if hit_player {
            player_struck = true;
        }
        if hit_tile || hit_player || hit_enemy {
            doomed.push(projectile.id.clone());
        }
    }
    for id in doomed {
        state.mark_projectile_dead(id);
    }
    if player_struck {
        match state.tuning.contact_outcome {
            ContactOutcome::Ignore => log::debug!("projectile struck the player"),
            ContactOutcome::ResetLevel => failed = true,
        }
    }

    // --- Collectibles ---
    let mut picked: Vec<usize> = Vec::new();
    for (i, collectible) in state.collectibles.iter_mut().enumerate() {
        collectible.update(&state.tuning);
        if collectible.body.rect().intersects(&player_rect) {
            picked.push(i);
        }
    }
    for i in picked.into_iter().rev() {
        let collectible = state.collectibles.remove(i);
        match collectible.kind {
            CollectibleKind::Carrot => {
                state.carrots += 1;
                log::debug!("carrot collected ({})", state.carrots);
            }
            CollectibleKind::Radish => {
                state.radishes += 1;
                log::debug!("radish collected ({})", state.radishes);
            }
            CollectibleKind::FinishMarker => {
                log::info!("finish marker reached");
                state.set_phase(SessionPhase::Complete);
            }
        }
    }

    // End-of-frame drain of the to-delete list
    state.flush_removals();

    // Reaching the finish on the same frame as a hit still counts
    if failed && state.phase() == SessionPhase::Playing {
        log::info!("player hit, level failed");
        state.set_phase(SessionPhase::Failed);
    }
}
