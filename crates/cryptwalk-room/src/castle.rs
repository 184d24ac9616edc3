//! The stock castle: thirty rooms over three floors.
//!
//! ```text
//! floor 3                           tower_top (exit)
//!                                      ║ red
//!          master_bedchamber       tower_stair      guest_chamber     treasury
//!                │                     │                 │               ║ yellow
//!      study ─ west_wing ───── grand_landing ───── east_wing ───── portrait_gallery
//!
//! floor 2         chapel ·····▸ throne_room ◂═ armory (blue)
//!                   │               ║ red        │
//!      library ─ west_gallery ─ castle_hall ─ east_gallery ─ kitchen
//!                                   │                          │
//!                               gatehouse                    pantry
//!
//! floor 1  crypt ─ catacombs ─ wine_cellar ─ cold_store
//!                     │            │
//!                  ossuary ─ basement_hall ═ prison_cells (green)
//!                     ▴            │
//!                 well_room    guard_barracks
//!                     └─ basement_treasure ─┘
//! ```
//!
//! `═`/`║` are locked doors, `·····▸` is a hidden door, `▴` is one-way
//! (well_room up into the ossuary, never back).
//! Stairs: throne_room ↕ grand_landing, gatehouse ↕ basement_hall,
//! pantry ↕ wine_cellar. The kitchen trapdoor drops into the cold store.
//! Secret passages: library ↔ study (bookcase), master_bedchamber ↔
//! treasury (clock), wine_cellar ↔ basement_treasure (barrel).

use cryptwalk_types::{
    AmbientMeta, Direction, DoorEdge, EnemySpawnDecl, FloorEdge, FloorKind, HazardSpawnDecl,
    ItemSpawnDecl, KeyColor, PassageType, PlayerSpawn, Position, RoomNode, RoomType, SecretEdge,
};

use crate::{Catalog, CatalogBuilder, CatalogConfig, CatalogError};

use Direction::{East, North, South, West};

const BASEMENT: u8 = 1;
const GROUND: u8 = 2;
const UPPER: u8 = 3;

const CENTER: Position = Position::new(5, 4);

// One step off the stairs so arrivals don't land on the stair tile.
const OFF_STAIRS: Position = Position::new(0, 1);

impl Catalog {
    /// The stock castle, starting in `castle_hall`.
    ///
    /// # Errors
    /// Only if the stock layout itself is broken; covered by tests.
    pub fn castle() -> Result<Catalog, CatalogError> {
        Self::castle_with(CatalogConfig::default())
    }

    /// The stock castle, validated under `config`.
    pub fn castle_with(config: CatalogConfig) -> Result<Catalog, CatalogError> {
        CatalogBuilder::with_config(config).rooms(castle_rooms()).build()
    }
}

fn entry_point(wall: Direction) -> Position {
    match wall {
        North => Position::new(5, 1),
        South => Position::new(5, 7),
        East => Position::new(9, 4),
        West => Position::new(1, 4),
    }
}

/// Adds an entry spawn beside every door, plus a default spawn in the middle.
fn framed(mut room: RoomNode) -> RoomNode {
    let walls: Vec<Direction> = room.doors.existing().map(|(wall, _)| wall).collect();
    for wall in walls {
        room = room.spawn(PlayerSpawn::entry(wall, entry_point(wall)));
    }
    room.spawn(PlayerSpawn::default_at(CENTER))
}

fn ambient(floor: u8) -> AmbientMeta {
    match floor {
        BASEMENT => AmbientMeta {
            music: Some("catacomb_drone".into()),
            light_level: 60,
            fog: true,
        },
        UPPER => AmbientMeta {
            music: Some("tower_winds".into()),
            light_level: 200,
            fog: false,
        },
        _ => AmbientMeta {
            music: Some("hall_theme".into()),
            ..AmbientMeta::default()
        },
    }
}

fn room(id: &str, floor: u8, room_type: RoomType) -> RoomNode {
    RoomNode::new(id, floor, room_type).ambient(ambient(floor))
}

fn stairs(destination: &str, at: (i32, i32)) -> FloorEdge {
    FloorEdge::to(destination, at).with_arrival_offset(OFF_STAIRS)
}

pub(crate) fn castle_rooms() -> Vec<RoomNode> {
    let mut rooms = ground_floor();
    rooms.extend(basement());
    rooms.extend(upper_floor());
    rooms.into_iter().map(framed).collect()
}

fn ground_floor() -> Vec<RoomNode> {
    vec![
        room("castle_hall", GROUND, RoomType::Hall)
            .start_room()
            .door(North, DoorEdge::locked("throne_room", KeyColor::Red))
            .door(South, DoorEdge::open("gatehouse"))
            .door(East, DoorEdge::open("east_gallery"))
            .door(West, DoorEdge::open("west_gallery")),
        room("throne_room", GROUND, RoomType::Hall)
            .door(South, DoorEdge::open("castle_hall"))
            .door(West, DoorEdge::open("chapel"))
            .door(East, DoorEdge::open("armory"))
            .floor(FloorKind::StairsUp, stairs("grand_landing", (8, 2)))
            .enemy(EnemySpawnDecl::new("royal_guard", (3, 3)))
            .enemy(EnemySpawnDecl::new("royal_guard", (7, 3))),
        room("west_gallery", GROUND, RoomType::Gallery)
            .door(East, DoorEdge::open("castle_hall"))
            .door(West, DoorEdge::open("library"))
            .door(North, DoorEdge::open("chapel"))
            .enemy(EnemySpawnDecl::new("bat", (4, 2)).with_probability(0.5)),
        room("library", GROUND, RoomType::Library)
            .door(East, DoorEdge::open("west_gallery"))
            .secret(SecretEdge::new(PassageType::Bookcase, "study", (2, 1)))
            .item(ItemSpawnDecl::new("old_tome", (3, 6)).persistent()),
        room("chapel", GROUND, RoomType::Chapel)
            .door(South, DoorEdge::open("west_gallery"))
            .door(East, DoorEdge::hidden("throne_room"))
            .item(ItemSpawnDecl::new("holy_water", (5, 2)).persistent()),
        room("east_gallery", GROUND, RoomType::Gallery)
            .door(West, DoorEdge::open("castle_hall"))
            .door(East, DoorEdge::open("kitchen"))
            .door(North, DoorEdge::open("armory"))
            .enemy(EnemySpawnDecl::new("bat", (6, 2)).with_probability(0.5)),
        room("armory", GROUND, RoomType::Armory)
            .door(South, DoorEdge::open("east_gallery"))
            .door(West, DoorEdge::locked("throne_room", KeyColor::Blue))
            .item(ItemSpawnDecl::new("iron_sword", (8, 6)).persistent())
            .enemy(EnemySpawnDecl::new("animated_armor", (5, 4)).unique()),
        room("kitchen", GROUND, RoomType::Kitchen)
            .door(West, DoorEdge::open("east_gallery"))
            .door(South, DoorEdge::open("pantry"))
            .floor(FloorKind::Trapdoor, FloorEdge::to("cold_store", (7, 6)))
            .hazard(HazardSpawnDecl::new("fire_grate", (3, 2)))
            .item(ItemSpawnDecl::new("bread", (6, 3)).with_probability(0.8)),
        room("pantry", GROUND, RoomType::Storeroom)
            .door(North, DoorEdge::open("kitchen"))
            .floor(FloorKind::StairsDown, stairs("wine_cellar", (2, 6)))
            .enemy(EnemySpawnDecl::new("rat", (7, 5)).with_probability(0.75)),
        room("gatehouse", GROUND, RoomType::Hall)
            .door(North, DoorEdge::open("castle_hall"))
            .floor(FloorKind::StairsDown, stairs("basement_hall", (9, 7))),
    ]
}

fn basement() -> Vec<RoomNode> {
    vec![
        room("basement_hall", BASEMENT, RoomType::Cellar)
            .door(North, DoorEdge::open("wine_cellar"))
            .door(East, DoorEdge::locked("prison_cells", KeyColor::Green))
            .door(South, DoorEdge::open("guard_barracks"))
            .door(West, DoorEdge::open("ossuary"))
            .floor(FloorKind::StairsUp, stairs("gatehouse", (9, 1))),
        room("wine_cellar", BASEMENT, RoomType::Cellar)
            .door(South, DoorEdge::open("basement_hall"))
            .door(West, DoorEdge::open("catacombs"))
            .door(East, DoorEdge::open("cold_store"))
            .floor(FloorKind::StairsUp, stairs("pantry", (2, 1)))
            .secret(SecretEdge::new(PassageType::Barrel, "basement_treasure", (8, 7))),
        room("cold_store", BASEMENT, RoomType::Storeroom)
            .door(West, DoorEdge::open("wine_cellar"))
            .item(ItemSpawnDecl::new("salted_meat", (4, 4)).with_probability(0.6)),
        room("catacombs", BASEMENT, RoomType::Crypt)
            .door(East, DoorEdge::open("wine_cellar"))
            .door(West, DoorEdge::open("crypt"))
            .door(South, DoorEdge::open("ossuary"))
            .enemy(EnemySpawnDecl::new("skeleton", (3, 3)).with_probability(0.75))
            .enemy(EnemySpawnDecl::new("skeleton", (7, 5)).with_probability(0.75)),
        room("crypt", BASEMENT, RoomType::Crypt)
            .door(East, DoorEdge::open("catacombs"))
            .enemy(EnemySpawnDecl::new("crypt_lord", (5, 3)).unique())
            .item(ItemSpawnDecl::new("blue_key", (5, 2)).persistent()),
        room("ossuary", BASEMENT, RoomType::Crypt)
            .door(North, DoorEdge::open("catacombs"))
            .door(East, DoorEdge::open("basement_hall"))
            .door(South, DoorEdge::one_way("well_room").admitting(North))
            .hazard(HazardSpawnDecl::new("bone_spikes", (5, 6))),
        room("prison_cells", BASEMENT, RoomType::Prison)
            .door(West, DoorEdge::open("basement_hall"))
            .enemy(EnemySpawnDecl::new("jailer", (6, 4)).unique())
            .item(ItemSpawnDecl::new("yellow_key", (9, 7)).persistent()),
        room("guard_barracks", BASEMENT, RoomType::Armory)
            .door(North, DoorEdge::open("basement_hall"))
            .door(West, DoorEdge::open("basement_treasure"))
            .enemy(EnemySpawnDecl::new("guard", (4, 4)))
            .item(ItemSpawnDecl::new("green_key", (8, 2)).persistent()),
        room("basement_treasure", BASEMENT, RoomType::Treasury)
            .door(East, DoorEdge::open("guard_barracks"))
            .door(West, DoorEdge::open("well_room"))
            .secret(SecretEdge::new(PassageType::Barrel, "wine_cellar", (1, 1)))
            .item(ItemSpawnDecl::new("ACG_A", (0, 0)).persistent())
            .item(ItemSpawnDecl::new("gold_coin", (6, 6))),
        room("well_room", BASEMENT, RoomType::Cellar)
            .door(East, DoorEdge::open("basement_treasure"))
            .door(North, DoorEdge::one_way("ossuary"))
            .hazard(HazardSpawnDecl::new("deep_well", (5, 4))),
    ]
}

fn upper_floor() -> Vec<RoomNode> {
    vec![
        room("grand_landing", UPPER, RoomType::Hall)
            .door(East, DoorEdge::open("east_wing"))
            .door(West, DoorEdge::open("west_wing"))
            .door(North, DoorEdge::open("tower_stair"))
            .floor(FloorKind::StairsDown, stairs("throne_room", (8, 2))),
        room("west_wing", UPPER, RoomType::Corridor)
            .door(East, DoorEdge::open("grand_landing"))
            .door(West, DoorEdge::open("study"))
            .door(North, DoorEdge::open("master_bedchamber"))
            .enemy(EnemySpawnDecl::new("ghost", (5, 4)).with_probability(0.3)),
        room("study", UPPER, RoomType::Study)
            .door(East, DoorEdge::open("west_wing"))
            .secret(SecretEdge::new(PassageType::Bookcase, "library", (2, 1)))
            .item(ItemSpawnDecl::new("red_key", (3, 3)).persistent()),
        room("master_bedchamber", UPPER, RoomType::Bedchamber)
            .door(South, DoorEdge::open("west_wing"))
            .secret(SecretEdge::new(PassageType::Clock, "treasury", (9, 1))),
        room("east_wing", UPPER, RoomType::Corridor)
            .door(West, DoorEdge::open("grand_landing"))
            .door(East, DoorEdge::open("portrait_gallery"))
            .door(North, DoorEdge::open("guest_chamber")),
        room("guest_chamber", UPPER, RoomType::Bedchamber)
            .door(South, DoorEdge::open("east_wing"))
            .enemy(EnemySpawnDecl::new("ghost", (4, 3)).with_probability(0.3)),
        room("portrait_gallery", UPPER, RoomType::Gallery)
            .door(West, DoorEdge::open("east_wing"))
            .door(North, DoorEdge::locked("treasury", KeyColor::Yellow))
            .enemy(EnemySpawnDecl::new("haunted_portrait", (5, 1)).unique()),
        room("treasury", UPPER, RoomType::Treasury)
            .door(South, DoorEdge::open("portrait_gallery"))
            .secret(SecretEdge::new(PassageType::Clock, "master_bedchamber", (1, 1)))
            .item(ItemSpawnDecl::new("crown", (5, 3)).persistent())
            .item(ItemSpawnDecl::new("gold_coin", (3, 5)))
            .item(ItemSpawnDecl::new("gold_coin", (7, 5))),
        room("tower_stair", UPPER, RoomType::Tower)
            .door(South, DoorEdge::open("grand_landing"))
            .door(North, DoorEdge::locked("tower_top", KeyColor::Red)),
        room("tower_top", UPPER, RoomType::Tower)
            .exit_room()
            .door(South, DoorEdge::open("tower_stair"))
            .enemy(EnemySpawnDecl::new("lich_king", (5, 3)).unique()),
    ]
}
