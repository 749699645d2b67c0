//! Props spawned next to a replacement enemy so its element can be dealt with.
//!
//! Every recipe is a fixed layout relative to the enemy's footprint. Nothing
//! here is random; the only state is the id counter.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::elements::{Element, ElementFlags};

/// Synthesized objects are numbered from here upward.
pub const FIRST_MAP_OBJECT_ID: u32 = 1000;

/// Session-wide source of unique `mapId`s for synthesized objects.
///
/// Never rolled back between map loads, so ids stay unique for the whole
/// session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapObjectIds {
    next: u32,
}

impl MapObjectIds {
    pub fn new() -> Self {
        Self { next: FIRST_MAP_OBJECT_ID }
    }

    pub fn starting_at(next: u32) -> Self {
        Self { next }
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }

    pub fn peek(&self) -> u32 {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = FIRST_MAP_OBJECT_ID;
    }
}

impl Default for MapObjectIds {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Recipe {
    Pole,
    Magnet,
    TeslaCoil,
    Compressor,
    WaveTeleport,
    WaterBubblePanel,
}

impl Recipe {
    pub const ALL: [Recipe; 6] = [
        Recipe::Pole,
        Recipe::Magnet,
        Recipe::TeslaCoil,
        Recipe::Compressor,
        Recipe::WaveTeleport,
        Recipe::WaterBubblePanel,
    ];

    /// Recipe named by an enemy record's `mapElements`; `None` for empty or
    /// unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pole" => Some(Self::Pole),
            "magnet" => Some(Self::Magnet),
            "teslaCoil" => Some(Self::TeslaCoil),
            "compressor" => Some(Self::Compressor),
            "waveTeleport" => Some(Self::WaveTeleport),
            "waterBubblePanel" => Some(Self::WaterBubblePanel),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Pole => "pole",
            Self::Magnet => "magnet",
            Self::TeslaCoil => "teslaCoil",
            Self::Compressor => "compressor",
            Self::WaveTeleport => "waveTeleport",
            Self::WaterBubblePanel => "waterBubblePanel",
        }
    }
}

/// Area an enemy (or spawner) occupies; props are laid out relative to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub width: f64,
    pub height: f64,
}

impl Footprint {
    fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    fn far_corner(&self) -> (f64, f64) {
        (self.x + self.width, self.y + self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoilType {
    Source,
    Extender,
    GroundDischarge,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    ElementPole,
    Magnet { dir: Direction },
    TeslaCoil { coil_type: CoilType },
    Compressor,
    AntiCompressor,
    Marker { name: String, dir: Direction },
    WaveTeleport,
    BallChanger { element: Element },
    WaterBubblePanel,
}

impl ObjectKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ElementPole => "ElementPole",
            Self::Magnet { .. } => "Magnet",
            Self::TeslaCoil { .. } => "TeslaCoil",
            Self::Compressor => "Compressor",
            Self::AntiCompressor => "AntiCompressor",
            Self::Marker { .. } => "Marker",
            Self::WaveTeleport => "WaveTeleport",
            Self::BallChanger { .. } => "BallChanger",
            Self::WaterBubblePanel => "WaterBubblePanel",
        }
    }
}

/// A declarative entity to instantiate once the map has finished loading.
#[derive(Clone, Debug, PartialEq)]
pub struct MapObject {
    pub kind: ObjectKind,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub map_id: u32,
}

impl MapObject {
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Host-facing `settings` object.
    pub fn settings(&self) -> ObjectSettings<'_> {
        ObjectSettings(self)
    }
}

impl Serialize for MapObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MapObject", 5)?;
        state.serialize_field("type", self.type_name())?;
        state.serialize_field("x", &self.x)?;
        state.serialize_field("y", &self.y)?;
        state.serialize_field("z", &self.z)?;
        state.serialize_field("settings", &self.settings())?;
        state.end()
    }
}

pub struct ObjectSettings<'a>(&'a MapObject);

#[derive(Serialize)]
struct ChangerType {
    #[serde(rename = "type")]
    kind: &'static str,
    settings: ChangerElement,
}

#[derive(Serialize)]
struct ChangerElement {
    element: Element,
}

impl Serialize for ObjectSettings<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let object = self.0;
        let mut map = serializer.serialize_map(None)?;
        match &object.kind {
            ObjectKind::Marker { name, .. } => map.serialize_entry("name", name)?,
            _ => map.serialize_entry("name", "")?,
        }
        match &object.kind {
            ObjectKind::ElementPole => {
                map.serialize_entry("poleType", "LONG")?;
                map.serialize_entry("group", "")?;
            }
            ObjectKind::Magnet { dir } | ObjectKind::Marker { dir, .. } => {
                map.serialize_entry("dir", dir)?;
            }
            ObjectKind::TeslaCoil { coil_type } => map.serialize_entry("coilType", coil_type)?,
            ObjectKind::BallChanger { element } => {
                map.serialize_entry("condition", "")?;
                map.serialize_entry(
                    "changerType",
                    &ChangerType {
                        kind: "CHANGE_ELEMENT",
                        settings: ChangerElement { element: *element },
                    },
                )?;
            }
            ObjectKind::Compressor
            | ObjectKind::AntiCompressor
            | ObjectKind::WaveTeleport
            | ObjectKind::WaterBubblePanel => {}
        }
        map.serialize_entry("mapId", &object.map_id)?;
        map.end()
    }
}

/// Lays out `recipe` around `footprint`, taking one id per object in
/// emission order. Wave-changer stations are only added when the player
/// cannot use wave yet.
pub fn synthesize(
    recipe: Recipe,
    footprint: &Footprint,
    elements: ElementFlags,
    ids: &mut MapObjectIds,
) -> Vec<MapObject> {
    let (mx, my) = footprint.center();
    let (x2, y2) = footprint.far_corner();
    let Footprint { x, y, z, .. } = *footprint;
    let mut place = |kind: ObjectKind, x: f64, y: f64| MapObject { kind, x, y, z, map_id: ids.next_id() };

    match recipe {
        Recipe::Pole => vec![place(ObjectKind::ElementPole, mx - 8.0, my + 64.0)],
        Recipe::Magnet => vec![place(ObjectKind::Magnet { dir: Direction::North }, mx - 8.0, y2 - 24.0)],
        Recipe::TeslaCoil => vec![
            place(ObjectKind::TeslaCoil { coil_type: CoilType::Source }, x + 4.0, y + 4.0),
            place(ObjectKind::AntiCompressor, x + 24.0, y + 4.0),
            place(ObjectKind::TeslaCoil { coil_type: CoilType::GroundDischarge }, x + 4.0, y + 20.0),
            place(ObjectKind::Compressor, x - 20.0, y + 4.0),
        ],
        Recipe::Compressor => vec![
            place(
                ObjectKind::Marker { name: "boldPnt1".to_string(), dir: Direction::North },
                mx - 16.0,
                my - 16.0,
            ),
            place(ObjectKind::Compressor, x + 80.0, y2 - 80.0),
        ],
        Recipe::WaveTeleport => {
            let mut objects = vec![
                place(ObjectKind::WaveTeleport, x + 32.0, y + 32.0),
                place(ObjectKind::WaveTeleport, x2 - 32.0, y2 - 32.0),
            ];
            if !elements.wave {
                let wave = ObjectKind::BallChanger { element: Element::Wave };
                objects.push(place(wave.clone(), x + 32.0, y2 - 48.0));
                objects.push(place(wave, x2 - 48.0, y + 32.0));
            }
            objects
        }
        Recipe::WaterBubblePanel => vec![place(ObjectKind::WaterBubblePanel, mx + 56.0, my + 56.0)],
    }
}

/// Same as [`synthesize`], starting from a recipe name.
pub fn synthesize_named(
    recipe_name: &str,
    footprint: &Footprint,
    elements: ElementFlags,
    ids: &mut MapObjectIds,
) -> Vec<MapObject> {
    Recipe::from_name(recipe_name)
        .map(|recipe| synthesize(recipe, footprint, elements, ids))
        .unwrap_or_default()
}
