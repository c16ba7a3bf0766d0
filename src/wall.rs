use std::fmt;

use bevy::{
    ecs::{lifecycle::HookContext, world::DeferredWorld},
    platform::collections::{HashMap, hash_map},
    prelude::*,
};
use smallvec::SmallVec;

/// The walls returned by a single [`WallQuery`].
pub type Walls = SmallVec<[WallFootprint; 4]>;

/// The axis-aligned area occupied by a single static obstacle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallFootprint {
    pub center: Vec2,
    pub half_extent: Vec2,
    pub kind: WallKind,
}

/// The material of a wall. Both kinds block tanks and projectiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WallKind {
    /// Brick walls can be worn down by projectile hits.
    #[default]
    Brick,
    /// Metal walls are indestructible.
    Metal,
}

/// Reports the walls intersecting a probe rectangle.
///
/// Implementations must be total and free of side effects. The order of the returned walls is not
/// significant.
pub trait WallQuery {
    /// Returns every wall whose footprint intersects `probe`.
    fn walls_overlapping(&self, probe: Rect) -> Walls;
}

/// A static obstacle which blocks [`Tank`](crate::Tank) movement.
#[derive(Component, Clone, Copy, Debug)]
#[component(on_insert = Wall::on_insert, on_replace = Wall::on_replace)]
pub struct Wall {
    footprint: WallFootprint,
}

/// A spatial index of the [`Wall`] entities in the world, bucketed by tile.
#[derive(Resource, Debug)]
pub struct WallIndex {
    tile_size: f32,
    walls: HashMap<Entity, WallFootprint>,
    tiles: HashMap<Tile, SmallVec<[Entity; 4]>>,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Tile(IVec2);

#[derive(Clone, Copy, Debug, PartialEq, Message)]
pub(crate) struct WallChanged {
    pub(crate) wall: Entity,
    pub(crate) old: Option<WallFootprint>,
    pub(crate) new: Option<WallFootprint>,
}

pub(crate) fn update_index(
    mut index: ResMut<WallIndex>,
    mut wall_reader: MessageReader<WallChanged>,
) {
    for event in wall_reader.read() {
        if event.old.is_some() {
            index.remove_wall(event.wall);
        }

        if let Some(new) = event.new {
            index.insert_wall(event.wall, new);
        }
    }
}

impl WallFootprint {
    /// Creates the footprint of a brick wall.
    pub fn new(center: Vec2, half_extent: Vec2) -> Self {
        WallFootprint {
            center,
            half_extent,
            kind: WallKind::Brick,
        }
    }

    pub fn with_kind(mut self, kind: WallKind) -> Self {
        self.kind = kind;
        self
    }

    /// Creates the footprint of a wall filling a single cell of a level grid.
    ///
    /// Cells are centred on integer multiples of `cell_size`.
    pub fn from_cell(cell: IVec2, cell_size: f32) -> Self {
        WallFootprint {
            center: cell.as_vec2() * cell_size,
            half_extent: Vec2::splat(cell_size / 2.0),
            kind: WallKind::Brick,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center_half_size(self.center, self.half_extent)
    }

    /// Returns `true` if the interiors of this footprint and `rect` intersect.
    ///
    /// Rectangles which only share an edge do not overlap.
    pub fn overlaps(&self, rect: Rect) -> bool {
        let own = self.rect();
        own.min.x < rect.max.x
            && rect.min.x < own.max.x
            && own.min.y < rect.max.y
            && rect.min.y < own.max.y
    }
}

impl WallKind {
    pub fn is_destructible(self) -> bool {
        self == WallKind::Brick
    }
}

impl WallQuery for [WallFootprint] {
    fn walls_overlapping(&self, probe: Rect) -> Walls {
        self.iter()
            .filter(|wall| wall.overlaps(probe))
            .copied()
            .collect()
    }
}

impl WallQuery for Vec<WallFootprint> {
    fn walls_overlapping(&self, probe: Rect) -> Walls {
        self.as_slice().walls_overlapping(probe)
    }
}

impl<T> WallQuery for &T
where
    T: WallQuery + ?Sized,
{
    fn walls_overlapping(&self, probe: Rect) -> Walls {
        (**self).walls_overlapping(probe)
    }
}

impl<T> WallQuery for Res<'_, T>
where
    T: WallQuery + Resource,
{
    fn walls_overlapping(&self, probe: Rect) -> Walls {
        (**self).walls_overlapping(probe)
    }
}

impl Wall {
    pub fn new(center: Vec2, half_extent: Vec2) -> Self {
        Wall {
            footprint: WallFootprint::new(center, half_extent),
        }
    }

    pub fn with_kind(mut self, kind: WallKind) -> Self {
        self.footprint.kind = kind;
        self
    }

    pub fn footprint(&self) -> WallFootprint {
        self.footprint
    }

    pub fn kind(&self) -> WallKind {
        self.footprint.kind
    }

    fn on_insert(mut world: DeferredWorld, context: HookContext) {
        if let Some(wall) = world.entity(context.entity).get::<Wall>().copied() {
            world.write_message(WallChanged {
                wall: context.entity,
                old: None,
                new: Some(wall.footprint),
            });
        }
    }

    fn on_replace(mut world: DeferredWorld, context: HookContext) {
        if let Some(wall) = world.entity(context.entity).get::<Wall>().copied() {
            world.write_message(WallChanged {
                wall: context.entity,
                old: Some(wall.footprint),
                new: None,
            });
        }
    }
}

impl From<WallFootprint> for Wall {
    fn from(footprint: WallFootprint) -> Self {
        Wall { footprint }
    }
}

impl WallIndex {
    /// Creates a new, empty [`WallIndex`] with the given tile size.
    ///
    /// The tile size should be comparable to the size of a wall. Each wall is stored once per tile it covers.
    pub fn new(tile_size: f32) -> Self {
        WallIndex {
            tile_size,
            walls: HashMap::default(),
            tiles: HashMap::default(),
        }
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Returns the number of walls in the index.
    pub fn len(&self) -> usize {
        self.walls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    /// Returns the footprint of the given wall entity, if it is indexed.
    pub fn get(&self, id: Entity) -> Option<WallFootprint> {
        self.walls.get(&id).copied()
    }

    pub(crate) fn insert_wall(&mut self, id: Entity, footprint: WallFootprint) {
        if let Some(old) = self.walls.insert(id, footprint) {
            self.remove_from_tiles(id, old);
        }

        for tile in Tile::covering(footprint.rect(), self.tile_size) {
            self.tiles.entry(tile).or_default().push(id);
        }
    }

    pub(crate) fn remove_wall(&mut self, id: Entity) {
        if let Some(old) = self.walls.remove(&id) {
            self.remove_from_tiles(id, old);
        }
    }

    fn remove_from_tiles(&mut self, id: Entity, footprint: WallFootprint) {
        for tile in Tile::covering(footprint.rect(), self.tile_size) {
            match self.tiles.entry(tile) {
                hash_map::Entry::Vacant(_) => {}
                hash_map::Entry::Occupied(mut entry) => {
                    let walls = entry.get_mut();
                    if let Some(pos) = walls.iter().position(|&w| w == id) {
                        walls.swap_remove(pos);
                    }
                    if walls.is_empty() {
                        entry.remove();
                    }
                }
            }
        }
    }

    pub(crate) fn get_walls(&self, tile: Tile) -> &[Entity] {
        match self.tiles.get(&tile) {
            Some(walls) => walls,
            None => &[],
        }
    }
}

impl Default for WallIndex {
    fn default() -> Self {
        WallIndex::new(1.0)
    }
}

impl WallQuery for WallIndex {
    fn walls_overlapping(&self, probe: Rect) -> Walls {
        let mut visited = SmallVec::<[Entity; 8]>::new();
        let mut walls = Walls::new();

        for tile in Tile::covering(probe, self.tile_size) {
            for &id in self.get_walls(tile) {
                if visited.contains(&id) {
                    continue;
                }
                visited.push(id);

                if let Some(footprint) = self.walls.get(&id) {
                    if footprint.overlaps(probe) {
                        walls.push(*footprint);
                    }
                }
            }
        }

        walls
    }
}

impl Tile {
    pub(crate) fn floor(position: Vec2, tile_size: f32) -> Self {
        Tile((position / tile_size).floor().as_ivec2())
    }

    // Every tile touched by `rect`, row by row.
    pub(crate) fn covering(rect: Rect, tile_size: f32) -> impl Iterator<Item = Tile> {
        let Tile(min) = Tile::floor(rect.min, tile_size);
        let Tile(max) = Tile::floor(rect.max, tile_size);
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| Tile(IVec2::new(x, y))))
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tile")
            .field(&self.0.x)
            .field(&self.0.y)
            .finish()
    }
}
