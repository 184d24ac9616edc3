//! The room catalog: every room node, validated once and shared read-only.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use cryptwalk_types::{
    Codec, Direction, DoorKind, EdgeLabel, JsonCodec, RoomId, RoomNode, SpawnDecl,
};
use tracing::{debug, info, warn};

use crate::{CatalogConfig, CatalogError};

// ---------------------------------------------------------------------------
// CatalogBuilder
// ---------------------------------------------------------------------------

/// Collects room nodes, then validates them into a [`Catalog`].
///
/// ```rust
/// use cryptwalk_room::CatalogBuilder;
/// use cryptwalk_types::{Direction, DoorEdge, RoomNode, RoomType};
///
/// let catalog = CatalogBuilder::new()
///     .room(
///         RoomNode::new("hall", 1, RoomType::Hall)
///             .start_room()
///             .door(Direction::East, DoorEdge::open("pantry")),
///     )
///     .room(
///         RoomNode::new("pantry", 1, RoomType::Storeroom)
///             .door(Direction::West, DoorEdge::open("hall")),
///     )
///     .build()
///     .unwrap();
///
/// assert_eq!(catalog.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    rooms: Vec<RoomNode>,
    config: CatalogConfig,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CatalogConfig) -> Self {
        Self {
            rooms: Vec::new(),
            config,
        }
    }

    /// Adds a room. Duplicates are reported by [`build`](Self::build).
    pub fn register_room(&mut self, room: RoomNode) -> &mut Self {
        self.rooms.push(room);
        self
    }

    /// Chaining form of [`register_room`](Self::register_room).
    pub fn room(mut self, room: RoomNode) -> Self {
        self.rooms.push(room);
        self
    }

    pub fn rooms(mut self, rooms: impl IntoIterator<Item = RoomNode>) -> Self {
        self.rooms.extend(rooms);
        self
    }

    /// Validates the rooms and freezes them into a catalog.
    ///
    /// # Errors
    /// - [`CatalogError::DuplicateRoom`] if two rooms share an id
    /// - [`CatalogError::InvalidProbability`] for a spawn chance outside `0..=1`
    /// - [`CatalogError::LockedWithoutKey`] for a locked door with no key colour
    /// - [`CatalogError::DanglingEdge`] if an edge names a room that isn't registered
    /// - [`CatalogError::MissingStartRoom`] / [`CatalogError::MultipleStartRooms`]
    /// - [`CatalogError::AsymmetricDoor`] when `require_reciprocal_doors` is set
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let Self { mut rooms, config } = self;

        let mut ids = HashSet::new();
        for room in &rooms {
            if !ids.insert(room.room_id.clone()) {
                return Err(CatalogError::DuplicateRoom(room.room_id.clone()));
            }
        }

        for room in &mut rooms {
            collapse_duplicate_spawns(room);
            check_room(room)?;
        }

        for room in &rooms {
            for (edge, destination) in room.existing_edges() {
                if !ids.contains(destination) {
                    return Err(CatalogError::DanglingEdge {
                        room: room.room_id.clone(),
                        edge,
                        destination: destination.clone(),
                    });
                }
            }
        }

        let starts: Vec<RoomId> = rooms
            .iter()
            .filter(|room| room.is_start_room)
            .map(|room| room.room_id.clone())
            .collect();
        let start = match starts.as_slice() {
            [] => return Err(CatalogError::MissingStartRoom),
            [only] => only.clone(),
            _ => return Err(CatalogError::MultipleStartRooms(starts)),
        };

        let mut catalog = Catalog::assemble(rooms, Some(start), config);

        if let Some((room, direction)) = catalog.asymmetric.first() {
            if catalog.config.require_reciprocal_doors {
                return Err(CatalogError::AsymmetricDoor {
                    room: room.clone(),
                    direction: *direction,
                });
            }
        }
        for (room, direction) in &catalog.asymmetric {
            warn!(%room, %direction, "door has no door leading back");
        }

        catalog.unreachable = catalog.find_unreachable();
        for room in &catalog.unreachable {
            warn!(%room, "room is unreachable from the start room");
        }

        info!(
            rooms = catalog.len(),
            floors = catalog.floors().len(),
            start = %catalog.start.as_ref().map(RoomId::as_str).unwrap_or_default(),
            "room catalog built"
        );
        Ok(catalog)
    }

    /// Freezes the rooms without validating them.
    ///
    /// For harnesses that need a deliberately broken graph (a dangling edge,
    /// no start room). Later duplicates of a room id are dropped.
    pub fn build_unchecked(self) -> Catalog {
        let Self { rooms, config } = self;
        let start = rooms
            .iter()
            .find(|room| room.is_start_room)
            .map(|room| room.room_id.clone());
        let mut catalog = Catalog::assemble(rooms, start, config);
        catalog.unreachable = catalog.find_unreachable();
        debug!(rooms = catalog.len(), "room catalog built without validation");
        catalog
    }
}

fn check_room(room: &RoomNode) -> Result<(), CatalogError> {
    for (direction, door) in room.doors.existing() {
        if door.kind == DoorKind::Locked && door.required_key.is_none() {
            return Err(CatalogError::LockedWithoutKey {
                room: room.room_id.clone(),
                direction,
            });
        }
    }

    let probabilities = room
        .enemies
        .iter()
        .map(|d| (d.template(), d.probability()))
        .chain(room.items.iter().map(|d| (d.template(), d.probability())))
        .chain(room.hazards.iter().map(|d| (d.template(), d.probability())));
    for (template, probability) in probabilities {
        if !(0.0..=1.0).contains(&probability) {
            return Err(CatalogError::InvalidProbability {
                room: room.room_id.clone(),
                template: template.clone(),
                probability,
            });
        }
    }
    Ok(())
}

/// Two declarations with the same `(room, template, position)` are the
/// same persistent fact. Keep the first.
fn collapse_duplicate_spawns(room: &mut RoomNode) {
    let room_id = room.room_id.clone();
    collapse(&room_id, &mut room.enemies);
    collapse(&room_id, &mut room.items);
    collapse(&room_id, &mut room.hazards);
}

fn collapse<D: SpawnDecl>(room: &RoomId, decls: &mut Vec<D>) {
    let mut seen = HashSet::new();
    decls.retain(|decl| {
        let identity = decl.identity(room);
        if seen.contains(&identity) {
            warn!(%identity, "duplicate spawn declaration collapsed");
            false
        } else {
            seen.insert(identity);
            true
        }
    });
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The immutable room graph.
///
/// Rooms are handed out as `Arc<RoomNode>` so the engine and collaborators
/// can hold on to the current room without copying it.
#[derive(Debug, Clone)]
pub struct Catalog {
    rooms: HashMap<RoomId, Arc<RoomNode>>,
    /// Registration order, for stable iteration.
    order: Vec<RoomId>,
    start: Option<RoomId>,
    asymmetric: Vec<(RoomId, Direction)>,
    unreachable: Vec<RoomId>,
    config: CatalogConfig,
}

impl Catalog {
    fn assemble(rooms: Vec<RoomNode>, start: Option<RoomId>, config: CatalogConfig) -> Self {
        let mut map = HashMap::with_capacity(rooms.len());
        let mut order = Vec::with_capacity(rooms.len());
        for room in rooms {
            if map.contains_key(&room.room_id) {
                warn!(room = %room.room_id, "duplicate room dropped");
                continue;
            }
            order.push(room.room_id.clone());
            map.insert(room.room_id.clone(), Arc::new(room));
        }

        let mut catalog = Self {
            rooms: map,
            order,
            start,
            asymmetric: Vec::new(),
            unreachable: Vec::new(),
            config,
        };
        catalog.asymmetric = catalog.find_asymmetric();
        catalog
    }

    /// Decodes a list of room records with `codec` and builds a catalog.
    ///
    /// # Errors
    /// [`CatalogError::Codec`] for malformed records, otherwise anything
    /// [`CatalogBuilder::build`] returns.
    pub fn from_records<C: Codec>(
        codec: &C,
        data: &[u8],
        config: CatalogConfig,
    ) -> Result<Self, CatalogError> {
        let rooms: Vec<RoomNode> = codec.decode(data)?;
        CatalogBuilder::with_config(config).rooms(rooms).build()
    }

    /// [`from_records`](Self::from_records) with JSON and the default config.
    pub fn from_json(data: &[u8]) -> Result<Self, CatalogError> {
        Self::from_records(&JsonCodec, data, CatalogConfig::default())
    }

    /// Encodes every room, in registration order, as JSON records.
    pub fn to_json(&self) -> Result<Vec<u8>, CatalogError> {
        let records: Vec<&RoomNode> = self.iter().map(Arc::as_ref).collect();
        Ok(JsonCodec.encode(&records)?)
    }

    pub fn get_room(&self, id: &RoomId) -> Option<&Arc<RoomNode>> {
        self.rooms.get(id)
    }

    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    /// The designated start room. Always `Some` for a validated catalog.
    pub fn start_room(&self) -> Option<&Arc<RoomNode>> {
        self.start.as_ref().and_then(|id| self.rooms.get(id))
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// All rooms in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RoomNode>> {
        self.order.iter().filter_map(|id| self.rooms.get(id))
    }

    pub fn rooms_on_floor(&self, floor: u8) -> Vec<&Arc<RoomNode>> {
        self.iter().filter(|room| room.floor_number == floor).collect()
    }

    pub fn exit_rooms(&self) -> Vec<&Arc<RoomNode>> {
        self.iter().filter(|room| room.is_exit_room).collect()
    }

    /// Distinct floor numbers, lowest first.
    pub fn floors(&self) -> BTreeSet<u8> {
        self.iter().map(|room| room.floor_number).collect()
    }

    /// Doors whose destination has no door on the opposite wall leading
    /// back. The engine falls back to the destination's default spawn for
    /// these.
    pub fn asymmetric_doors(&self) -> &[(RoomId, Direction)] {
        &self.asymmetric
    }

    /// Rooms no chain of existing edges reaches from the start room.
    pub fn unreachable_rooms(&self) -> &[RoomId] {
        &self.unreachable
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    fn find_asymmetric(&self) -> Vec<(RoomId, Direction)> {
        let mut found = Vec::new();
        for room in self.iter() {
            for (direction, door) in room.doors.existing() {
                let leads_back = self.rooms.get(&door.destination).is_some_and(|dest| {
                    let back = dest.doors.get(direction.opposite());
                    back.exists && back.destination == room.room_id
                });
                if !leads_back {
                    found.push((room.room_id.clone(), direction));
                }
            }
        }
        found
    }

    fn find_unreachable(&self) -> Vec<RoomId> {
        let Some(start) = self.start.as_ref() else {
            return self.order.clone();
        };

        let mut seen: HashSet<&RoomId> = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            let Some(room) = self.rooms.get(id) else {
                continue;
            };
            for (_, destination) in room.existing_edges() {
                if self.rooms.contains_key(destination) && seen.insert(destination) {
                    queue.push_back(destination);
                }
            }
        }

        self.order
            .iter()
            .filter(|id| !seen.contains(id))
            .cloned()
            .collect()
    }
}

/// Labels every edge of `room`; used in diagnostics.
pub(crate) fn describe_edges(room: &RoomNode) -> Vec<String> {
    room.existing_edges()
        .into_iter()
        .map(|(label, destination): (EdgeLabel, &RoomId)| format!("{label} -> {destination}"))
        .collect()
}
