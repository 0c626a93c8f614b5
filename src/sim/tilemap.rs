//! Sparse tile grid
//!
//! Levels are mostly empty space, so tiles live in a hash map keyed by
//! integer grid coordinate rather than a dense array. The on-disk format
//! keys tiles by `"x;y"` strings (the level editor writes them that way);
//! the key is an `IVec2` so lookups never allocate.
//!
//! The grid answers two physics questions:
//! - which solid rectangles are near a point (3x3 neighborhood scan)
//! - what exactly occupies one specific neighboring cell (ledge/wall probes)
//!
//! Lookups that find nothing solid yield [`Aabb::null`], a sentinel box far
//! outside the world, so collision code runs the same path either way.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::aabb::Aabb;

/// Fixed 3x3 neighborhood scan order, row-major from top-left
pub const NEIGHBOR_OFFSETS: [IVec2; 9] = [
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
    IVec2::new(-1, 0),
    IVec2::new(0, 0),
    IVec2::new(1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
    IVec2::new(1, 1),
];

/// What a tile is, as a closed set rather than a free string so the
/// solid-tile check stays exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Ground/wall terrain
    Solid,
    /// Hollow terrain; some level rulesets treat it as climbable/solid
    Air,
    /// Authoring marker consumed at load to spawn a collectible entity
    Collectible,
    /// Authoring marker consumed at load to spawn the player or an enemy
    Spawner,
    /// Purely visual, never collides
    Decoration,
}

/// A grid-aligned tile. Identity is its grid position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub variant: i32,
    /// Quarter turns clockwise, 0..=3 (render-only)
    pub rotation: u8,
    /// Grid coordinate (not pixels)
    pub pos: IVec2,
}

/// A tile placed off the grid, at a continuous pixel position.
/// Stored in placement order; removal is by identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffgridTile {
    pub kind: TileKind,
    pub variant: i32,
    pub rotation: u8,
    /// Pixel coordinate
    pub pos: Vec2,
}

/// Failures constructing or loading a level
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level file could not be read: {0}")]
    Io(#[from] std::io::Error),
    #[error("level file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tile size must be positive, got {0}")]
    InvalidTileSize(i32),
    #[error("malformed grid key {0:?} (expected \"x;y\")")]
    BadGridKey(String),
    #[error("level has no player spawner")]
    MissingPlayerSpawn,
}

/// On-disk level shape: `"x;y"`-keyed grid tiles plus an ordered off-grid list
#[derive(Serialize, Deserialize)]
struct LevelFile {
    tilemap: BTreeMap<String, Tile>,
    tile_size: i32,
    offgrid_tiles: Vec<OffgridTile>,
}

/// The sparse tile grid for one level
#[derive(Debug, Clone)]
pub struct TileMap {
    tile_size: i32,
    tiles: HashMap<IVec2, Tile>,
    offgrid: Vec<OffgridTile>,
    /// Which kinds count as solid for physics; a ruleset knob, not a constant
    solid: Vec<TileKind>,
}

impl TileMap {
    pub fn new(tile_size: i32) -> Result<Self, LevelError> {
        if tile_size <= 0 {
            return Err(LevelError::InvalidTileSize(tile_size));
        }
        Ok(Self {
            tile_size,
            tiles: HashMap::new(),
            offgrid: Vec::new(),
            solid: vec![TileKind::Solid],
        })
    }

    #[inline]
    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }

    /// Replace the set of tile kinds that collide
    pub fn set_solid_kinds(&mut self, kinds: &[TileKind]) {
        self.solid = kinds.to_vec();
    }

    #[inline]
    pub fn is_solid_kind(&self, kind: TileKind) -> bool {
        self.solid.contains(&kind)
    }

    /// Grid cell containing a continuous-space position.
    /// Floor division, so negative coordinates land in the right cell.
    #[inline]
    pub fn cell_of(&self, pos: Vec2) -> IVec2 {
        let ts = self.tile_size as f32;
        IVec2::new((pos.x / ts).floor() as i32, (pos.y / ts).floor() as i32)
    }

    /// O(1) lookup of the tile at a grid coordinate
    pub fn tile_at(&self, cell: IVec2) -> Option<&Tile> {
        self.tiles.get(&cell)
    }

    /// Place or replace a grid tile (editor path). The tile's `pos` is its key.
    pub fn set_tile(&mut self, tile: Tile) {
        self.tiles.insert(tile.pos, tile);
    }

    /// Remove the grid tile at a coordinate (editor path)
    pub fn remove_tile(&mut self, cell: IVec2) -> Option<Tile> {
        self.tiles.remove(&cell)
    }

    /// Append an off-grid tile (editor path)
    pub fn place_offgrid(&mut self, tile: OffgridTile) {
        self.offgrid.push(tile);
    }

    /// Remove the first off-grid tile equal to `tile`; true if one was removed
    pub fn remove_offgrid(&mut self, tile: &OffgridTile) -> bool {
        match self.offgrid.iter().position(|t| t == tile) {
            Some(i) => {
                self.offgrid.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn offgrid_tiles(&self) -> &[OffgridTile] {
        &self.offgrid
    }

    /// Tiles in the 3x3 neighborhood (center included) around the cell
    /// containing `pos`, in fixed scan order
    pub fn neighbors(&self, pos: Vec2) -> impl Iterator<Item = &Tile> {
        let cell = self.cell_of(pos);
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |offset| self.tiles.get(&(cell + *offset)))
    }

    /// Pixel-space rectangle of a grid tile
    fn tile_rect(&self, tile: &Tile) -> Aabb {
        let ts = self.tile_size as f32;
        Aabb::new(
            Vec2::new(tile.pos.x as f32 * ts, tile.pos.y as f32 * ts),
            Vec2::splat(ts),
        )
    }

    /// Solid rectangles in the 3x3 neighborhood around `pos`
    pub fn solid_rects_near(&self, pos: Vec2) -> Vec<Aabb> {
        self.neighbors(pos)
            .filter(|tile| self.is_solid_kind(tile.kind))
            .map(|tile| self.tile_rect(tile))
            .collect()
    }

    /// The tile exactly `offset` cells away from the cell containing `pos`
    pub fn tile_near(&self, pos: Vec2, offset: IVec2) -> Option<&Tile> {
        self.tiles.get(&(self.cell_of(pos) + offset))
    }

    /// Solid rectangle of exactly one neighboring cell, or the null rect if
    /// that cell is empty or non-solid. Used by ledge/wall probes that must
    /// ask about a precise cell, not a neighborhood.
    pub fn specific_rect(&self, pos: Vec2, offset: IVec2) -> Aabb {
        match self.tile_near(pos, offset) {
            Some(tile) if self.is_solid_kind(tile.kind) => self.tile_rect(tile),
            _ => Aabb::null(),
        }
    }

    /// Remove (unless `keep`) and return every tile matching one of the
    /// `(kind, variant)` pairs, grid-aligned or off-grid. Grid tile positions
    /// come back pre-multiplied by the tile size so callers can spawn
    /// entities directly at the returned pixel position; off-grid positions
    /// are returned verbatim.
    pub fn extract(&mut self, id_pairs: &[(TileKind, i32)], keep: bool) -> Vec<OffgridTile> {
        let wanted = |kind: TileKind, variant: i32| {
            id_pairs.iter().any(|&(k, v)| k == kind && v == variant)
        };

        let mut matches = Vec::new();

        let mut i = 0;
        while i < self.offgrid.len() {
            let tile = self.offgrid[i];
            if wanted(tile.kind, tile.variant) {
                matches.push(tile);
                if !keep {
                    self.offgrid.remove(i);
                    continue;
                }
            }
            i += 1;
        }

        // Stable grid order regardless of hash map internals
        let mut cells: Vec<IVec2> = self
            .tiles
            .iter()
            .filter(|(_, t)| wanted(t.kind, t.variant))
            .map(|(cell, _)| *cell)
            .collect();
        cells.sort_by_key(|c| (c.y, c.x));

        let ts = self.tile_size as f32;
        for cell in cells {
            let found = if keep {
                self.tiles.get(&cell).copied()
            } else {
                self.tiles.remove(&cell)
            };
            let Some(tile) = found else { continue };
            matches.push(OffgridTile {
                kind: tile.kind,
                variant: tile.variant,
                rotation: tile.rotation,
                pos: Vec2::new(tile.pos.x as f32 * ts, tile.pos.y as f32 * ts),
            });
        }

        matches
    }

    /// Serialize to the `"x;y"`-keyed JSON wire format
    pub fn to_json(&self) -> Result<String, LevelError> {
        let mut tilemap = BTreeMap::new();
        for (cell, tile) in &self.tiles {
            tilemap.insert(format!("{};{}", cell.x, cell.y), *tile);
        }
        let file = LevelFile {
            tilemap,
            tile_size: self.tile_size,
            offgrid_tiles: self.offgrid.clone(),
        };
        Ok(serde_json::to_string(&file)?)
    }

    /// Parse the JSON wire format, validating tile size and grid keys
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let file: LevelFile = serde_json::from_str(json)?;
        let mut map = TileMap::new(file.tile_size)?;
        for (key, mut tile) in file.tilemap {
            let cell = parse_grid_key(&key)?;
            tile.pos = cell;
            map.tiles.insert(cell, tile);
        }
        map.offgrid = file.offgrid_tiles;
        Ok(map)
    }

    pub fn save(&self, path: &Path) -> Result<(), LevelError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("saved level to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)?;
        let map = Self::from_json(&json)?;
        log::info!(
            "loaded level from {} ({} tiles, {} off-grid)",
            path.display(),
            map.tiles.len(),
            map.offgrid.len()
        );
        Ok(map)
    }

    /// Grid tiles in stable (y, x) order, for rendering or inspection.
    /// Callers decide editor-vs-play presentation; the grid has no mode.
    pub fn tiles(&self) -> Vec<&Tile> {
        let mut tiles: Vec<&Tile> = self.tiles.values().collect();
        tiles.sort_by_key(|t| (t.pos.y, t.pos.x));
        tiles
    }

    pub fn grid_len(&self) -> usize {
        self.tiles.len()
    }
}

fn parse_grid_key(key: &str) -> Result<IVec2, LevelError> {
    let bad = || LevelError::BadGridKey(key.to_string());
    let (x, y) = key.split_once(';').ok_or_else(bad)?;
    let x: i32 = x.trim().parse().map_err(|_| bad())?;
    let y: i32 = y.trim().parse().map_err(|_| bad())?;
    Ok(IVec2::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_at(x: i32, y: i32) -> Tile {
        Tile {
            kind: TileKind::Solid,
            variant: 0,
            rotation: 0,
            pos: IVec2::new(x, y),
        }
    }

    fn collectible_at(x: i32, y: i32, variant: i32) -> Tile {
        Tile {
            kind: TileKind::Collectible,
            variant,
            rotation: 0,
            pos: IVec2::new(x, y),
        }
    }

    #[test]
    fn test_cell_of_floors_negatives() {
        let map = TileMap::new(16).unwrap();
        assert_eq!(map.cell_of(Vec2::new(17.0, -1.0)), IVec2::new(1, -1));
        assert_eq!(map.cell_of(Vec2::new(-0.5, -16.0)), IVec2::new(-1, -1));
        assert_eq!(map.cell_of(Vec2::new(0.0, 0.0)), IVec2::new(0, 0));
    }

    #[test]
    fn test_invalid_tile_size_rejected() {
        assert!(matches!(
            TileMap::new(0),
            Err(LevelError::InvalidTileSize(0))
        ));
        assert!(matches!(
            TileMap::new(-4),
            Err(LevelError::InvalidTileSize(-4))
        ));
    }

    #[test]
    fn test_neighbors_cover_3x3() {
        let mut map = TileMap::new(16).unwrap();
        for x in 0..5 {
            for y in 0..5 {
                map.set_tile(solid_at(x, y));
            }
        }
        // Position inside cell (2,2): all 9 neighbors present
        let found: Vec<IVec2> = map
            .neighbors(Vec2::new(40.0, 40.0))
            .map(|t| t.pos)
            .collect();
        assert_eq!(found.len(), 9);
        assert_eq!(found[0], IVec2::new(1, 1)); // scan starts top-left
        assert_eq!(found[8], IVec2::new(3, 3));
    }

    #[test]
    fn test_solid_rects_respect_configured_set() {
        let mut map = TileMap::new(16).unwrap();
        map.set_tile(solid_at(0, 1));
        map.set_tile(Tile {
            kind: TileKind::Air,
            variant: 0,
            rotation: 0,
            pos: IVec2::new(1, 1),
        });

        let near = Vec2::new(8.0, 8.0);
        assert_eq!(map.solid_rects_near(near).len(), 1);

        // An "air is climbable" ruleset widens the solid set
        map.set_solid_kinds(&[TileKind::Solid, TileKind::Air]);
        assert_eq!(map.solid_rects_near(near).len(), 2);
    }

    #[test]
    fn test_specific_rect_sentinel() {
        let mut map = TileMap::new(16).unwrap();
        map.set_tile(solid_at(1, 0));
        map.set_tile(collectible_at(0, 1, 0));

        let origin = Vec2::new(4.0, 4.0);
        let hit = map.specific_rect(origin, IVec2::new(1, 0));
        assert_eq!(hit.pos, Vec2::new(16.0, 0.0));
        assert_eq!(hit.size, Vec2::splat(16.0));

        // Empty cell and non-solid cell both yield the sentinel
        assert!(map.specific_rect(origin, IVec2::new(-1, 0)).is_null());
        assert!(map.specific_rect(origin, IVec2::new(0, 1)).is_null());
    }

    #[test]
    fn test_extract_exhaustive_and_exclusive() {
        let mut map = TileMap::new(16).unwrap();
        map.set_tile(collectible_at(0, 0, 0));
        map.set_tile(collectible_at(3, 1, 0));
        map.set_tile(collectible_at(5, 2, 0));
        map.set_tile(collectible_at(1, 4, 1)); // radish, not asked for

        let carrots = map.extract(&[(TileKind::Collectible, 0)], false);
        assert_eq!(carrots.len(), 3);
        // Grid positions come back in pixels
        assert!(carrots.iter().any(|t| t.pos == Vec2::new(48.0, 16.0)));

        // Default extract consumes: a second call finds nothing
        assert!(map.extract(&[(TileKind::Collectible, 0)], false).is_empty());
        // The radish is still there
        assert_eq!(map.extract(&[(TileKind::Collectible, 1)], true).len(), 1);
        assert_eq!(map.grid_len(), 1);
    }

    #[test]
    fn test_extract_offgrid_verbatim() {
        let mut map = TileMap::new(16).unwrap();
        map.place_offgrid(OffgridTile {
            kind: TileKind::Spawner,
            variant: 2,
            rotation: 0,
            pos: Vec2::new(12.5, 33.0),
        });
        let found = map.extract(&[(TileKind::Spawner, 2)], false);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pos, Vec2::new(12.5, 33.0));
        assert!(map.offgrid_tiles().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_grid_and_offgrid_order() {
        let mut map = TileMap::new(16).unwrap();
        map.set_tile(solid_at(-2, 3));
        map.set_tile(solid_at(7, -1));
        map.set_tile(collectible_at(4, 4, 1));
        for i in 0..3 {
            map.place_offgrid(OffgridTile {
                kind: TileKind::Decoration,
                variant: i,
                rotation: (i % 4) as u8,
                pos: Vec2::new(i as f32 * 7.5, 3.25),
            });
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.json");
        map.save(&path).unwrap();
        let loaded = TileMap::load(&path).unwrap();

        assert_eq!(loaded.tile_size(), map.tile_size());
        assert_eq!(loaded.grid_len(), map.grid_len());
        for tile in map.tiles() {
            assert_eq!(loaded.tile_at(tile.pos), Some(tile));
        }
        assert_eq!(loaded.offgrid_tiles(), map.offgrid_tiles());
    }

    #[test]
    fn test_bad_grid_key_rejected() {
        let json = r#"{"tilemap": {"3:4": {"kind": "solid", "variant": 0, "rotation": 0, "pos": [3, 4]}}, "tile_size": 16, "offgrid_tiles": []}"#;
        assert!(matches!(
            TileMap::from_json(json),
            Err(LevelError::BadGridKey(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TileMap::load(Path::new("/nonexistent/levels/42.json")).unwrap_err();
        assert!(matches!(err, LevelError::Io(_)));
    }
}
