use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const COMPONENT_KEYS: [&str; 2] = ["0", "1"];
pub const GEOSET_GROUP_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum ItemDataError {
    #[error("Failed to read item file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to write item file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid item data: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ItemRarity {
    Poor = 0,
    Common = 1,
    Uncommon = 2,
    Rare = 3,
    Epic = 4,
    Legendary = 5,
    Artifact = 6,
    Heirloom = 7,
}

impl TryFrom<i64> for ItemRarity {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Poor,
            1 => Self::Common,
            2 => Self::Uncommon,
            3 => Self::Rare,
            4 => Self::Epic,
            5 => Self::Legendary,
            6 => Self::Artifact,
            7 => Self::Heirloom,
            other => return Err(format!("unknown item rarity {other}")),
        })
    }
}

impl From<ItemRarity> for i64 {
    fn from(value: ItemRarity) -> Self {
        value as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum InventoryType {
    NonEquip = 0,
    Head = 1,
    Neck = 2,
    Shoulders = 3,
    Body = 4,
    Chest = 5,
    Waist = 6,
    Legs = 7,
    Feet = 8,
    Wrists = 9,
    Hands = 10,
    Finger = 11,
    Trinket = 12,
    Weapon = 13,
    Shield = 14,
    Ranged = 15,
    Cloak = 16,
    TwoHandWeapon = 17,
    Bag = 18,
    Tabard = 19,
    Robe = 20,
    MainHand = 21,
    OffHand = 22,
    Holdable = 23,
    Ammo = 24,
    Thrown = 25,
    RangedRight = 26,
    Quiver = 27,
    Relic = 28,
}

impl InventoryType {
    const ALL: [InventoryType; 29] = [
        Self::NonEquip,
        Self::Head,
        Self::Neck,
        Self::Shoulders,
        Self::Body,
        Self::Chest,
        Self::Waist,
        Self::Legs,
        Self::Feet,
        Self::Wrists,
        Self::Hands,
        Self::Finger,
        Self::Trinket,
        Self::Weapon,
        Self::Shield,
        Self::Ranged,
        Self::Cloak,
        Self::TwoHandWeapon,
        Self::Bag,
        Self::Tabard,
        Self::Robe,
        Self::MainHand,
        Self::OffHand,
        Self::Holdable,
        Self::Ammo,
        Self::Thrown,
        Self::RangedRight,
        Self::Quiver,
        Self::Relic,
    ];
}

impl TryFrom<i64> for InventoryType {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or_else(|| format!("unknown inventory type {value}"))
    }
}

impl From<InventoryType> for i64 {
    fn from(value: InventoryType) -> Self {
        value as i64
    }
}

pub const ARMOR_SUBCLASS_CLOTH: i32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    pub name: String,
    pub file_icon_id: i64,
    pub file_icon_name: String,
    pub rarity: ItemRarity,
    pub sheathe_type: i32,
    pub sub_class: i32,
}

impl Default for ItemMetadata {
    fn default() -> Self {
        Self {
            name: "My Awesome Item".to_string(),
            file_icon_id: 0,
            file_icon_name: "inv_misc_questionmark.blp".to_string(),
            rarity: ItemRarity::Legendary,
            sheathe_type: 0,
            sub_class: ARMOR_SUBCLASS_CLOTH,
        }
    }
}

/// A catalog file referenced by id, with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub id: i64,
    pub name: String,
}

impl FileReference {
    pub fn unset() -> Self {
        Self {
            id: -1,
            name: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentModel {
    pub texture: FileReference,
    #[serde(default)]
    pub models: Vec<FileReference>,
}

impl Default for ComponentModel {
    fn default() -> Self {
        Self {
            texture: FileReference::unset(),
            models: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleColor {
    pub start: i64,
    pub mid: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmetGeosetOverride {
    pub race_id: i32,
    pub geoset_group: i32,
}

/// The persisted `itemData` record the editor mutates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    #[serde(default)]
    pub metadata: ItemMetadata,
    #[serde(default)]
    pub item_materials: BTreeMap<String, FileReference>,
    #[serde(default)]
    pub item_component_models: BTreeMap<String, ComponentModel>,
    #[serde(default)]
    pub particle_colors: Vec<ParticleColor>,
    #[serde(default)]
    pub helmet_geo_vis_male: Vec<HelmetGeosetOverride>,
    #[serde(default)]
    pub helmet_geo_vis_female: Vec<HelmetGeosetOverride>,
    #[serde(default)]
    pub flags: u32,
    #[serde(default = "default_inventory_type")]
    pub inventory_type: InventoryType,
    #[serde(default, deserialize_with = "deserialize_geoset_group")]
    pub geo_set_group: [i32; GEOSET_GROUP_LEN],
}

fn default_inventory_type() -> InventoryType {
    InventoryType::Head
}

fn deserialize_geoset_group<'de, D>(deserializer: D) -> Result<[i32; GEOSET_GROUP_LEN], D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<i32>>::deserialize(deserializer)?.unwrap_or_default();
    let mut group = [0; GEOSET_GROUP_LEN];
    for (slot, value) in group.iter_mut().zip(values) {
        *slot = value;
    }
    Ok(group)
}

impl Default for ItemData {
    fn default() -> Self {
        let item_component_models = COMPONENT_KEYS
            .iter()
            .map(|key| (key.to_string(), ComponentModel::default()))
            .collect();

        Self {
            metadata: ItemMetadata::default(),
            item_materials: BTreeMap::new(),
            item_component_models,
            particle_colors: Vec::new(),
            helmet_geo_vis_male: Vec::new(),
            helmet_geo_vis_female: Vec::new(),
            flags: 0,
            inventory_type: default_inventory_type(),
            geo_set_group: [0; GEOSET_GROUP_LEN],
        }
    }
}

impl ItemData {
    /// Decodes a record from any source and restores the component invariant.
    pub fn from_value(value: Value) -> Result<Self, ItemDataError> {
        let mut item: ItemData = serde_json::from_value(value)?;
        item.normalize();
        Ok(item)
    }

    pub fn load_file(path: &Path) -> Result<Self, ItemDataError> {
        let raw = fs::read_to_string(path).map_err(|source| ItemDataError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let value: Value = serde_json::from_str(&raw)?;
        Self::from_value(value)
    }

    pub fn export_file(&self, path: &Path) -> Result<(), ItemDataError> {
        let serialized = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ItemDataError::Write {
                path: parent.display().to_string(),
                source,
            })?;
        }
        fs::write(path, serialized).map_err(|source| ItemDataError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Keeps exactly the two component slots; missing ones get defaults.
    pub fn normalize(&mut self) {
        self.item_component_models
            .retain(|key, _| COMPONENT_KEYS.contains(&key.as_str()));
        for key in COMPONENT_KEYS {
            self.item_component_models
                .entry(key.to_string())
                .or_default();
        }
    }

    pub fn component(&self, index: usize) -> Option<&ComponentModel> {
        COMPONENT_KEYS
            .get(index)
            .and_then(|key| self.item_component_models.get(*key))
    }
}
