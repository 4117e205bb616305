//! Presentation Snapshot
//!
//! A read-only, serializable picture of one frame for whatever draws it:
//! every object's draw info, minimap markers and the tile layout.

use serde::{Serialize, Deserialize};

use crate::game::map::{DoorDirections, Slot, TileId, TileShape};
use crate::game::object::{DrawInfo, GameObject, MinimapMarker, ObjectCategory, ObjectId};
use crate::game::state::GameContext;

/// What kind of object a drawn entry is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotKind {
    /// The player
    Player,
    /// An enemy
    Enemy,
    /// A pickup
    Collectable,
    /// A shot
    Projectile,
    /// An effect
    Particle,
}

impl From<ObjectCategory> for SnapshotKind {
    fn from(category: ObjectCategory) -> Self {
        match category {
            ObjectCategory::Projectile => SnapshotKind::Projectile,
            ObjectCategory::Particle => SnapshotKind::Particle,
            ObjectCategory::Collectable => SnapshotKind::Collectable,
            ObjectCategory::Enemy => SnapshotKind::Enemy,
        }
    }
}

/// One drawn object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    /// Object id
    pub id: ObjectId,
    /// Object kind
    pub kind: SnapshotKind,
    /// Drawing data
    pub draw: DrawInfo,
}

/// One tile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    /// Tile id
    pub id: TileId,
    /// Slot occupied
    pub slot: Slot,
    /// Door sides
    pub doors: DoorDirections,
    /// Shape texture
    pub shape: TileShape,
    /// Shape rotation (radians)
    pub rotation: f32,
    /// Post-shift highlight remaining (seconds)
    pub highlight: f32,
}

/// Everything the presentation layer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Frame index
    pub frame: u64,
    /// Grid columns
    pub width: usize,
    /// Grid rows
    pub height: usize,
    /// World-space tile side
    pub tile_side_length: f32,
    /// Objects in draw order (player last)
    pub objects: Vec<ObjectSnapshot>,
    /// Minimap markers
    pub minimap: Vec<MinimapMarker>,
    /// Tiles in slot order
    pub tiles: Vec<TileSnapshot>,
}

impl FrameSnapshot {
    /// Capture the current state of a level.
    pub fn capture(ctx: &GameContext) -> Self {
        let physics = ctx.physics.as_ref();
        let mut objects = Vec::new();
        let mut minimap = Vec::new();

        let mut record = |object: &dyn GameObject, kind: SnapshotKind| {
            if let Some(draw) = object.draw_info(physics) {
                objects.push(ObjectSnapshot { id: object.id(), kind, draw });
            }
            minimap.extend(object.minimap_marker(physics));
        };

        for category in ObjectCategory::UPDATE_ORDER {
            for object in ctx.registry.objects(category) {
                record(object, category.into());
            }
        }
        record(ctx.registry.player(), SnapshotKind::Player);

        let tiles = ctx
            .map
            .tiles()
            .iter()
            .map(|t| TileSnapshot {
                id: t.id,
                slot: t.slot,
                doors: t.doors,
                shape: t.shape(),
                rotation: t.rotation(),
                highlight: t.highlight,
            })
            .collect();

        Self {
            frame: ctx.frame,
            width: ctx.map.width(),
            height: ctx.map.height(),
            tile_side_length: ctx.map.tile_side_length(),
            objects,
            minimap,
            tiles,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::{GameConfig, LevelConfig};
    use crate::game::object::MarkerKind;

    #[test]
    fn test_capture_demo_level() {
        let ctx = GameContext::with_defaults(LevelConfig::demo(), GameConfig::default()).unwrap();
        let snapshot = FrameSnapshot::capture(&ctx);

        assert_eq!(snapshot.frame, 1);
        assert_eq!(snapshot.tiles.len(), 16);
        assert_eq!(snapshot.objects.len(), 4);
        assert_eq!(snapshot.objects.last().map(|o| o.kind), Some(SnapshotKind::Player));

        let collectable_markers = snapshot
            .minimap
            .iter()
            .filter(|m| m.kind == MarkerKind::Collectable)
            .count();
        assert_eq!(collectable_markers, 3);
        assert!(snapshot.minimap.iter().any(|m| m.kind == MarkerKind::Player));

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"Player\""));
    }

    #[test]
    fn test_tile_snapshot_matches_grid() {
        let ctx = GameContext::with_defaults(LevelConfig::demo(), GameConfig::default()).unwrap();
        let snapshot = FrameSnapshot::capture(&ctx);
        for (tile, snap) in ctx.map.tiles().iter().zip(&snapshot.tiles) {
            assert_eq!(snap.id, tile.id);
            assert_eq!(snap.shape, tile.shape());
        }
    }
}
