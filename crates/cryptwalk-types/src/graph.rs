//! Room nodes, their edges, and their spawn declarations.
//!
//! These are authored records: built once (in code or from a record file),
//! validated by the catalog, then shared read-only for the rest of the
//! process. Every optional field carries a serde default so authored data
//! only has to spell out what a room actually has.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Direction, FloorKind, Identity, KeyColor, PassageType, Position, RoomId, TemplateId};

// ---------------------------------------------------------------------------
// Room metadata
// ---------------------------------------------------------------------------

/// What kind of room this is. Purely descriptive for the core; decoration
/// and atmosphere collaborators key their presentation off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    Hall,
    Corridor,
    Library,
    Armory,
    Chapel,
    Kitchen,
    Cellar,
    Crypt,
    Treasury,
    Gallery,
    Bedchamber,
    Study,
    Tower,
    Prison,
    Storeroom,
}

/// Ambient metadata handed to atmosphere collaborators as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientMeta {
    /// Music track name, if the room overrides the floor's default.
    pub music: Option<String>,
    /// 0 = pitch black, 255 = fully lit.
    pub light_level: u8,
    pub fog: bool,
}

impl Default for AmbientMeta {
    fn default() -> Self {
        Self {
            music: None,
            light_level: 160,
            fog: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Doors
// ---------------------------------------------------------------------------

/// How a door gates passage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorKind {
    /// Always passable.
    #[default]
    Open,
    /// Needs a key of `required_key` colour the first time; stays open after.
    Locked,
    /// Passable only in its authored direction of travel.
    OneWay,
    /// Invisible and impassable until revealed by a discovery trigger.
    Hidden,
}

/// A door in one of the four wall slots of a room.
///
/// `exists == false` means the slot is a plain wall: nothing else on the
/// edge matters. A `Locked` door always names its key; the catalog refuses
/// to build otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorEdge {
    pub exists: bool,
    pub kind: DoorKind,
    pub required_key: Option<KeyColor>,
    pub destination: RoomId,
    /// Nudge applied to the arrival spawn on the far side.
    pub arrival_offset: Position,
    /// For `OneWay` doors: the direction of travel the door admits.
    /// `None` means "the slot the door is authored in".
    pub one_way_travel: Option<Direction>,
}

impl Default for DoorEdge {
    fn default() -> Self {
        Self::absent()
    }
}

impl DoorEdge {
    /// A wall with no door.
    pub fn absent() -> Self {
        Self {
            exists: false,
            kind: DoorKind::Open,
            required_key: None,
            destination: RoomId::default(),
            arrival_offset: Position::ORIGIN,
            one_way_travel: None,
        }
    }

    pub fn open(destination: impl Into<RoomId>) -> Self {
        Self {
            exists: true,
            destination: destination.into(),
            ..Self::absent()
        }
    }

    pub fn locked(destination: impl Into<RoomId>, key: KeyColor) -> Self {
        Self {
            kind: DoorKind::Locked,
            required_key: Some(key),
            ..Self::open(destination)
        }
    }

    pub fn hidden(destination: impl Into<RoomId>) -> Self {
        Self {
            kind: DoorKind::Hidden,
            ..Self::open(destination)
        }
    }

    /// A one-way door passable when travelling through the slot it sits in.
    pub fn one_way(destination: impl Into<RoomId>) -> Self {
        Self {
            kind: DoorKind::OneWay,
            ..Self::open(destination)
        }
    }

    /// Overrides the direction of travel a one-way door admits. Used on the
    /// far side of a one-way door, where the slot points back against the flow.
    pub fn admitting(mut self, travel: Direction) -> Self {
        self.one_way_travel = Some(travel);
        self
    }

    pub fn with_arrival_offset(mut self, offset: impl Into<Position>) -> Self {
        self.arrival_offset = offset.into();
        self
    }
}

/// The four door slots of a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Doors {
    pub north: DoorEdge,
    pub south: DoorEdge,
    pub east: DoorEdge,
    pub west: DoorEdge,
}

impl Doors {
    pub fn get(&self, direction: Direction) -> &DoorEdge {
        match direction {
            Direction::North => &self.north,
            Direction::South => &self.south,
            Direction::East => &self.east,
            Direction::West => &self.west,
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> &mut DoorEdge {
        match direction {
            Direction::North => &mut self.north,
            Direction::South => &mut self.south,
            Direction::East => &mut self.east,
            Direction::West => &mut self.west,
        }
    }

    /// Iterates all four slots (existing or not) in [`Direction::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &DoorEdge)> {
        Direction::ALL.into_iter().map(move |dir| (dir, self.get(dir)))
    }

    /// Iterates only the slots that hold a door.
    pub fn existing(&self) -> impl Iterator<Item = (Direction, &DoorEdge)> {
        self.iter().filter(|(_, door)| door.exists)
    }
}

// ---------------------------------------------------------------------------
// Floor transitions and secret passages
// ---------------------------------------------------------------------------

/// A vertical connection: stairs or a trapdoor. Existence is the only gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorEdge {
    pub exists: bool,
    pub destination: RoomId,
    /// Where the stairs sit in this room.
    pub position: Position,
    /// Nudge applied to the arrival point on the far side.
    pub arrival_offset: Position,
}

impl Default for FloorEdge {
    fn default() -> Self {
        Self::absent()
    }
}

impl FloorEdge {
    pub fn absent() -> Self {
        Self {
            exists: false,
            destination: RoomId::default(),
            position: Position::ORIGIN,
            arrival_offset: Position::ORIGIN,
        }
    }

    pub fn to(destination: impl Into<RoomId>, position: impl Into<Position>) -> Self {
        Self {
            exists: true,
            destination: destination.into(),
            position: position.into(),
            arrival_offset: Position::ORIGIN,
        }
    }

    pub fn with_arrival_offset(mut self, offset: impl Into<Position>) -> Self {
        self.arrival_offset = offset.into();
        self
    }
}

/// The stairs-up, stairs-down, and trapdoor slots of a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Floors {
    pub stairs_up: FloorEdge,
    pub stairs_down: FloorEdge,
    pub trapdoor: FloorEdge,
}

impl Floors {
    pub fn get(&self, kind: FloorKind) -> &FloorEdge {
        match kind {
            FloorKind::StairsUp => &self.stairs_up,
            FloorKind::StairsDown => &self.stairs_down,
            FloorKind::Trapdoor => &self.trapdoor,
        }
    }

    pub fn get_mut(&mut self, kind: FloorKind) -> &mut FloorEdge {
        match kind {
            FloorKind::StairsUp => &mut self.stairs_up,
            FloorKind::StairsDown => &mut self.stairs_down,
            FloorKind::Trapdoor => &mut self.trapdoor,
        }
    }

    pub fn existing(&self) -> impl Iterator<Item = (FloorKind, &FloorEdge)> {
        FloorKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.get(kind)))
            .filter(|(_, edge)| edge.exists)
    }
}

/// A secret passage disguised as furniture. Always exists once authored;
/// gated by the traveler's passage-access capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretEdge {
    pub passage_type: PassageType,
    pub destination: RoomId,
    pub position: Position,
}

impl SecretEdge {
    pub fn new(
        passage_type: PassageType,
        destination: impl Into<RoomId>,
        position: impl Into<Position>,
    ) -> Self {
        Self {
            passage_type,
            destination: destination.into(),
            position: position.into(),
        }
    }
}

/// Names one edge of a room, for diagnostics and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeLabel {
    Door(Direction),
    Floor(FloorKind),
    Secret(usize),
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Door(dir) => write!(f, "{dir} door"),
            Self::Floor(kind) => write!(f, "{kind}"),
            Self::Secret(index) => write!(f, "secret passage #{index}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Spawn declarations
// ---------------------------------------------------------------------------

/// A place the traveler can appear in a room.
///
/// `entry` names the wall the spawn serves: a traveler coming through the
/// west door lands on the spawn tagged `West`. An untagged spawn is the
/// room's default spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSpawn {
    pub position: Position,
    #[serde(default)]
    pub entry: Option<Direction>,
}

impl PlayerSpawn {
    pub fn default_at(position: impl Into<Position>) -> Self {
        Self {
            position: position.into(),
            entry: None,
        }
    }

    pub fn entry(direction: Direction, position: impl Into<Position>) -> Self {
        Self {
            position: position.into(),
            entry: Some(direction),
        }
    }
}

fn certain() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

/// A declared enemy. `respawns_on_reentry == false` opts the enemy into
/// kill tracking: once killed it stays dead for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawnDecl {
    pub template: TemplateId,
    pub position: Position,
    #[serde(default = "certain")]
    pub probability: f64,
    #[serde(default = "yes")]
    pub respawns_on_reentry: bool,
}

impl EnemySpawnDecl {
    pub fn new(template: impl Into<TemplateId>, position: impl Into<Position>) -> Self {
        Self {
            template: template.into(),
            position: position.into(),
            probability: 1.0,
            respawns_on_reentry: true,
        }
    }

    /// Marks the enemy as killed-once: it never comes back this session.
    pub fn unique(mut self) -> Self {
        self.respawns_on_reentry = false;
        self
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }
}

/// A declared pickup. `persists_across_visits == true` opts the item into
/// collection tracking: once picked up it is gone for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpawnDecl {
    pub template: TemplateId,
    pub position: Position,
    #[serde(default = "certain")]
    pub probability: f64,
    #[serde(default)]
    pub persists_across_visits: bool,
}

impl ItemSpawnDecl {
    pub fn new(template: impl Into<TemplateId>, position: impl Into<Position>) -> Self {
        Self {
            template: template.into(),
            position: position.into(),
            probability: 1.0,
            persists_across_visits: false,
        }
    }

    pub fn persistent(mut self) -> Self {
        self.persists_across_visits = true;
        self
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }
}

/// A declared hazard (spikes, fire grate, ...). Hazards never track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardSpawnDecl {
    pub template: TemplateId,
    pub position: Position,
    #[serde(default = "certain")]
    pub probability: f64,
}

impl HazardSpawnDecl {
    pub fn new(template: impl Into<TemplateId>, position: impl Into<Position>) -> Self {
        Self {
            template: template.into(),
            position: position.into(),
            probability: 1.0,
        }
    }
}

/// Common view over the three spawn declaration kinds.
pub trait SpawnDecl {
    fn template(&self) -> &TemplateId;
    fn position(&self) -> Position;
    fn probability(&self) -> f64;

    /// Whether this declaration's resolution is remembered for the session.
    fn tracked(&self) -> bool;

    /// The stable identity of this declaration inside `room`.
    fn identity(&self, room: &RoomId) -> Identity {
        Identity {
            room: room.clone(),
            template: self.template().clone(),
            position: self.position(),
        }
    }
}

impl SpawnDecl for EnemySpawnDecl {
    fn template(&self) -> &TemplateId {
        &self.template
    }
    fn position(&self) -> Position {
        self.position
    }
    fn probability(&self) -> f64 {
        self.probability
    }
    fn tracked(&self) -> bool {
        !self.respawns_on_reentry
    }
}

impl SpawnDecl for ItemSpawnDecl {
    fn template(&self) -> &TemplateId {
        &self.template
    }
    fn position(&self) -> Position {
        self.position
    }
    fn probability(&self) -> f64 {
        self.probability
    }
    fn tracked(&self) -> bool {
        self.persists_across_visits
    }
}

impl SpawnDecl for HazardSpawnDecl {
    fn template(&self) -> &TemplateId {
        &self.template
    }
    fn position(&self) -> Position {
        self.position
    }
    fn probability(&self) -> f64 {
        self.probability
    }
    fn tracked(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// RoomNode
// ---------------------------------------------------------------------------

/// One node of the room graph.
///
/// Built with the chaining helpers below, or decoded from records:
///
/// ```rust
/// use cryptwalk_types::{Direction, DoorEdge, KeyColor, RoomNode, RoomType};
///
/// let hall = RoomNode::new("castle_hall", 2, RoomType::Hall)
///     .start_room()
///     .door(Direction::North, DoorEdge::locked("armory", KeyColor::Red));
///
/// assert!(hall.doors.north.exists);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomNode {
    pub room_id: RoomId,
    pub floor_number: u8,
    pub room_type: RoomType,
    #[serde(default)]
    pub is_start_room: bool,
    #[serde(default)]
    pub is_exit_room: bool,
    #[serde(default)]
    pub ambient: AmbientMeta,
    #[serde(default)]
    pub doors: Doors,
    #[serde(default)]
    pub floors: Floors,
    #[serde(default)]
    pub secrets: Vec<SecretEdge>,
    #[serde(default)]
    pub player_spawns: Vec<PlayerSpawn>,
    #[serde(default)]
    pub enemies: Vec<EnemySpawnDecl>,
    #[serde(default)]
    pub items: Vec<ItemSpawnDecl>,
    #[serde(default)]
    pub hazards: Vec<HazardSpawnDecl>,
}

impl RoomNode {
    pub fn new(room_id: impl Into<RoomId>, floor_number: u8, room_type: RoomType) -> Self {
        Self {
            room_id: room_id.into(),
            floor_number,
            room_type,
            is_start_room: false,
            is_exit_room: false,
            ambient: AmbientMeta::default(),
            doors: Doors::default(),
            floors: Floors::default(),
            secrets: Vec::new(),
            player_spawns: Vec::new(),
            enemies: Vec::new(),
            items: Vec::new(),
            hazards: Vec::new(),
        }
    }

    pub fn start_room(mut self) -> Self {
        self.is_start_room = true;
        self
    }

    pub fn exit_room(mut self) -> Self {
        self.is_exit_room = true;
        self
    }

    pub fn ambient(mut self, ambient: AmbientMeta) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn door(mut self, direction: Direction, door: DoorEdge) -> Self {
        *self.doors.get_mut(direction) = door;
        self
    }

    pub fn floor(mut self, kind: FloorKind, edge: FloorEdge) -> Self {
        *self.floors.get_mut(kind) = edge;
        self
    }

    pub fn secret(mut self, edge: SecretEdge) -> Self {
        self.secrets.push(edge);
        self
    }

    pub fn spawn(mut self, spawn: PlayerSpawn) -> Self {
        self.player_spawns.push(spawn);
        self
    }

    pub fn enemy(mut self, decl: EnemySpawnDecl) -> Self {
        self.enemies.push(decl);
        self
    }

    pub fn item(mut self, decl: ItemSpawnDecl) -> Self {
        self.items.push(decl);
        self
    }

    pub fn hazard(mut self, decl: HazardSpawnDecl) -> Self {
        self.hazards.push(decl);
        self
    }

    /// Every edge that exists, with its label and destination.
    ///
    /// Doors first (in slot order), then floors, then secret passages in
    /// authored order.
    pub fn existing_edges(&self) -> Vec<(EdgeLabel, &RoomId)> {
        let doors = self
            .doors
            .existing()
            .map(|(dir, door)| (EdgeLabel::Door(dir), &door.destination));
        let floors = self
            .floors
            .existing()
            .map(|(kind, edge)| (EdgeLabel::Floor(kind), &edge.destination));
        let secrets = self
            .secrets
            .iter()
            .enumerate()
            .map(|(index, edge)| (EdgeLabel::Secret(index), &edge.destination));
        doors.chain(floors).chain(secrets).collect()
    }

    /// The spawn tagged for arrivals through `wall`, if one is authored.
    pub fn entry_spawn(&self, wall: Direction) -> Option<Position> {
        self.player_spawns
            .iter()
            .find(|spawn| spawn.entry == Some(wall))
            .map(|spawn| spawn.position)
    }

    /// The first untagged spawn, or failing that the first spawn of any kind.
    pub fn default_spawn(&self) -> Option<Position> {
        self.player_spawns
            .iter()
            .find(|spawn| spawn.entry.is_none())
            .or_else(|| self.player_spawns.first())
            .map(|spawn| spawn.position)
    }
}
