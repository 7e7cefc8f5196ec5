use std::{path::Path, sync::Mutex};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use serde::Serialize;
use thiserror::Error;

pub const MAX_SEARCH_LIMIT: u32 = 200;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{kind} {id} was not found in the catalog.")]
    NotFound { kind: &'static str, id: i64 },
    #[error("Catalog query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("Catalog connection lock poisoned.")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemToDisplay {
    pub item_id: i64,
    pub inventory_type: i64,
    pub item_name: String,
    pub item_display_id: i64,
    pub icon_file_id: i64,
    pub rarity: i64,
    pub sub_class_id: i64,
    pub sheathe_type: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResource {
    pub file_name: String,
    pub file_path: String,
    pub file_id: i64,
    pub model_resource_id: i64,
    pub race_id: i64,
    pub gender_id: i64,
    pub extra_data: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayModelResource {
    #[serde(flatten)]
    pub model: ModelResource,
    pub display_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureFile {
    pub file_name: String,
    pub file_id: i64,
    pub file_path: String,
    pub gender_id: i64,
    pub race_id: i64,
    pub class_id: i64,
    pub material_resource_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayTexture {
    #[serde(flatten)]
    pub texture: TextureFile,
    pub display_id: i64,
    pub component_section: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IconFile {
    pub file_id: i64,
    pub file_name: String,
}

const ITEM_COLUMNS: &str = "ItemID, InventoryType, ItemName, ItemDisplayInfoID, IconFileID, \
     Rarity, SubClassID, SheatheType";
const MODEL_COLUMNS: &str = "m.FileName, m.FilePath, m.FileID, m.ModelResourceID, m.RaceID, \
     m.GenderID, m.ExtraData";
const TEXTURE_COLUMNS: &str = "t.FileName, t.FileID, t.FilePath, t.GenderID, t.RaceID, \
     t.ClassID, t.MaterialResourceID";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ItemToDisplay> {
    Ok(ItemToDisplay {
        item_id: row.get(0)?,
        inventory_type: row.get(1)?,
        item_name: row.get(2)?,
        item_display_id: row.get(3)?,
        icon_file_id: row.get(4)?,
        rarity: row.get(5)?,
        sub_class_id: row.get(6)?,
        sheathe_type: row.get(7)?,
    })
}

fn model_from_row(row: &Row<'_>) -> rusqlite::Result<ModelResource> {
    Ok(ModelResource {
        file_name: row.get(0)?,
        file_path: row.get(1)?,
        file_id: row.get(2)?,
        model_resource_id: row.get(3)?,
        race_id: row.get(4)?,
        gender_id: row.get(5)?,
        extra_data: row.get(6)?,
    })
}

fn texture_from_row(row: &Row<'_>) -> rusqlite::Result<TextureFile> {
    Ok(TextureFile {
        file_name: row.get(0)?,
        file_id: row.get(1)?,
        file_path: row.get(2)?,
        gender_id: row.get(3)?,
        race_id: row.get(4)?,
        class_id: row.get(5)?,
        material_resource_id: row.get(6)?,
    })
}

fn icon_from_row(row: &Row<'_>) -> rusqlite::Result<IconFile> {
    Ok(IconFile {
        file_id: row.get(0)?,
        file_name: row.get(1)?,
    })
}

fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_SEARCH_LIMIT)
}

/// Read-only view over the bundled asset catalog.
#[derive(Debug)]
pub struct Catalog {
    conn: Mutex<Connection>,
}

impl Catalog {
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        log::info!("[catalog] opened catalog database {}", path.display());
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(
        &self,
        query: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, CatalogError> {
        let conn = self.conn.lock().map_err(|_| CatalogError::Poisoned)?;
        query(&conn).map_err(CatalogError::from)
    }

    pub fn item_by_id(&self, item_id: i64) -> Result<ItemToDisplay, CatalogError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM item_to_display WHERE ItemID = ?1"),
                params![item_id],
                item_from_row,
            )
            .optional()
        })?
        .ok_or(CatalogError::NotFound {
            kind: "Item",
            id: item_id,
        })
    }

    pub fn search_items(
        &self,
        query: &str,
        inventory_type: Option<i64>,
        limit: u32,
    ) -> Result<Vec<ItemToDisplay>, CatalogError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM item_to_display
                 WHERE ItemName LIKE ?1 ESCAPE '\\'
                   AND (?2 IS NULL OR InventoryType = ?2)
                 ORDER BY ItemName, ItemID
                 LIMIT ?3"
            ))?;
            let rows = stmt.query_map(
                params![like_pattern(query), inventory_type, clamp_limit(limit)],
                item_from_row,
            )?;
            rows.collect()
        })
    }

    pub fn random_item(&self, inventory_type: Option<i64>) -> Result<ItemToDisplay, CatalogError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {ITEM_COLUMNS} FROM item_to_display
                     WHERE (?1 IS NULL OR InventoryType = ?1)
                     ORDER BY RANDOM() LIMIT 1"
                ),
                params![inventory_type],
                item_from_row,
            )
            .optional()
        })?
        .ok_or(CatalogError::NotFound {
            kind: "Item for inventory type",
            id: inventory_type.unwrap_or(-1),
        })
    }

    pub fn display_models(&self, display_id: i64) -> Result<Vec<DisplayModelResource>, CatalogError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MODEL_COLUMNS}, d.ItemDisplayInfoID
                 FROM item_display_models d
                 JOIN model_resources m ON m.ModelResourceID = d.ModelResourceID
                 WHERE d.ItemDisplayInfoID = ?1
                 ORDER BY d.ComponentIndex, m.RaceID, m.GenderID, m.FileID"
            ))?;
            let rows = stmt.query_map(params![display_id], |row| {
                Ok(DisplayModelResource {
                    model: model_from_row(row)?,
                    display_id: row.get(7)?,
                })
            })?;
            rows.collect()
        })
    }

    pub fn display_textures(&self, display_id: i64) -> Result<Vec<DisplayTexture>, CatalogError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TEXTURE_COLUMNS}, d.ItemDisplayInfoID, d.ComponentSection
                 FROM item_display_textures d
                 JOIN texture_files t ON t.MaterialResourceID = d.MaterialResourceID
                 WHERE d.ItemDisplayInfoID = ?1
                 ORDER BY d.ComponentSection, t.FileID"
            ))?;
            let rows = stmt.query_map(params![display_id], |row| {
                Ok(DisplayTexture {
                    texture: texture_from_row(row)?,
                    display_id: row.get(7)?,
                    component_section: row.get(8)?,
                })
            })?;
            rows.collect()
        })
    }

    pub fn model_resource_by_file_id(&self, file_id: i64) -> Result<ModelResource, CatalogError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {MODEL_COLUMNS} FROM model_resources m WHERE m.FileID = ?1"),
                params![file_id],
                model_from_row,
            )
            .optional()
        })?
        .ok_or(CatalogError::NotFound {
            kind: "Model file",
            id: file_id,
        })
    }

    pub fn search_model_resources(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<ModelResource>, CatalogError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MODEL_COLUMNS} FROM model_resources m
                 WHERE m.FileName LIKE ?1 ESCAPE '\\'
                 ORDER BY m.FileName, m.FileID
                 LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![like_pattern(query), clamp_limit(limit)], model_from_row)?;
            rows.collect()
        })
    }

    pub fn random_model_resource(&self) -> Result<ModelResource, CatalogError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {MODEL_COLUMNS} FROM model_resources m ORDER BY RANDOM() LIMIT 1"),
                [],
                model_from_row,
            )
            .optional()
        })?
        .ok_or(CatalogError::NotFound {
            kind: "Model file",
            id: -1,
        })
    }

    pub fn texture_by_file_id(&self, file_id: i64) -> Result<TextureFile, CatalogError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {TEXTURE_COLUMNS} FROM texture_files t WHERE t.FileID = ?1"),
                params![file_id],
                texture_from_row,
            )
            .optional()
        })?
        .ok_or(CatalogError::NotFound {
            kind: "Texture file",
            id: file_id,
        })
    }

    pub fn search_textures(&self, query: &str, limit: u32) -> Result<Vec<TextureFile>, CatalogError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TEXTURE_COLUMNS} FROM texture_files t
                 WHERE t.FileName LIKE ?1 ESCAPE '\\'
                 ORDER BY t.FileName, t.FileID
                 LIMIT ?2"
            ))?;
            let rows =
                stmt.query_map(params![like_pattern(query), clamp_limit(limit)], texture_from_row)?;
            rows.collect()
        })
    }

    pub fn random_texture(&self) -> Result<TextureFile, CatalogError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {TEXTURE_COLUMNS} FROM texture_files t ORDER BY RANDOM() LIMIT 1"),
                [],
                texture_from_row,
            )
            .optional()
        })?
        .ok_or(CatalogError::NotFound {
            kind: "Texture file",
            id: -1,
        })
    }

    pub fn icon_by_file_id(&self, file_id: i64) -> Result<IconFile, CatalogError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT FileID, FileName FROM icon_files WHERE FileID = ?1",
                params![file_id],
                icon_from_row,
            )
            .optional()
        })?
        .ok_or(CatalogError::NotFound {
            kind: "Icon file",
            id: file_id,
        })
    }

    pub fn search_icons(&self, query: &str, limit: u32) -> Result<Vec<IconFile>, CatalogError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT FileID, FileName FROM icon_files
                 WHERE FileName LIKE ?1 ESCAPE '\\'
                 ORDER BY FileName, FileID
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![like_pattern(query), clamp_limit(limit)], icon_from_row)?;
            rows.collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_types::BridgeResult;

    const SCHEMA: &str = "
        CREATE TABLE item_to_display (
            ItemID INTEGER PRIMARY KEY, InventoryType INTEGER, ItemName TEXT,
            ItemDisplayInfoID INTEGER, IconFileID INTEGER, Rarity INTEGER,
            SubClassID INTEGER, SheatheType INTEGER
        );
        CREATE TABLE model_resources (
            FileID INTEGER PRIMARY KEY, FileName TEXT, FilePath TEXT,
            ModelResourceID INTEGER, RaceID INTEGER, GenderID INTEGER, ExtraData INTEGER
        );
        CREATE TABLE item_display_models (
            ItemDisplayInfoID INTEGER, ComponentIndex INTEGER, ModelResourceID INTEGER
        );
        CREATE TABLE texture_files (
            FileID INTEGER PRIMARY KEY, FileName TEXT, FilePath TEXT, GenderID INTEGER,
            RaceID INTEGER, ClassID INTEGER, MaterialResourceID INTEGER
        );
        CREATE TABLE item_display_textures (
            ItemDisplayInfoID INTEGER, ComponentSection INTEGER, MaterialResourceID INTEGER
        );
        CREATE TABLE icon_files (FileID INTEGER PRIMARY KEY, FileName TEXT);

        INSERT INTO item_to_display VALUES
            (19019, 13, 'Thunderfury, Blessed Blade of the Windseeker', 30606, 135349, 5, 7, 3),
            (18832, 13, 'Brutality Blade', 31713, 135313, 4, 7, 3),
            (16914, 1, 'Netherwind Crown', 31102, 133076, 4, 1, 0),
            (12345, 1, 'Cap of 100%_Luck', 1, 1, 2, 1, 0);
        INSERT INTO model_resources VALUES
            (145000, 'sword_2h_thunderfury.m2', 'item/objectcomponents/weapon', 5001, 0, 2, 0),
            (145001, 'helm_cloth_netherwind_hu_m.m2', 'item/objectcomponents/head', 5002, 1, 0, 0),
            (145002, 'helm_cloth_netherwind_hu_f.m2', 'item/objectcomponents/head', 5002, 1, 1, 0);
        INSERT INTO item_display_models VALUES (31102, 0, 5002), (30606, 0, 5001);
        INSERT INTO texture_files VALUES
            (200000, 'helm_cloth_netherwind.blp', 'item/objectcomponents/head', 2, 0, 0, 7001),
            (200001, 'sword_thunderfury.blp', 'item/objectcomponents/weapon', 2, 0, 0, 7002);
        INSERT INTO item_display_textures VALUES (31102, 0, 7001);
        INSERT INTO icon_files VALUES
            (135349, 'inv_sword_39.blp'),
            (133076, 'inv_helmet_29.blp');
    ";

    fn seeded_catalog() -> (tempfile::TempDir, Catalog) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(SCHEMA).unwrap();
        }
        let catalog = Catalog::open(&path).unwrap();
        (dir, catalog)
    }

    #[test]
    fn item_by_id_returns_mapped_row() {
        let (_dir, catalog) = seeded_catalog();
        let item = catalog.item_by_id(16914).unwrap();
        assert_eq!(item.item_name, "Netherwind Crown");
        assert_eq!(item.item_display_id, 31102);
        assert_eq!(item.inventory_type, 1);
    }

    #[test]
    fn unknown_item_is_reported_as_error_envelope() {
        let (_dir, catalog) = seeded_catalog();
        let result: BridgeResult<ItemToDisplay> = catalog.item_by_id(1).into();
        assert!(!result.ok);
        assert!(result.result.is_none());
        assert_eq!(
            result.error.as_deref(),
            Some("Item 1 was not found in the catalog.")
        );
    }

    #[test]
    fn search_items_filters_by_substring_and_slot() {
        let (_dir, catalog) = seeded_catalog();

        let blades = catalog.search_items("blade", None, 10).unwrap();
        let names: Vec<_> = blades.iter().map(|item| item.item_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Brutality Blade", "Thunderfury, Blessed Blade of the Windseeker"]
        );

        let heads = catalog.search_items("", Some(1), 10).unwrap();
        assert_eq!(heads.len(), 2);
        assert!(heads.iter().all(|item| item.inventory_type == 1));
    }

    #[test]
    fn search_treats_like_wildcards_literally() {
        let (_dir, catalog) = seeded_catalog();
        let results = catalog.search_items("100%_", None, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item_id, 12345);

        assert!(catalog.search_items("%", None, 10).unwrap().iter().all(|item| item
            .item_name
            .contains('%')));
    }

    #[test]
    fn search_limit_is_clamped_to_at_least_one() {
        let (_dir, catalog) = seeded_catalog();
        assert_eq!(catalog.search_items("", None, 0).unwrap().len(), 1);
    }

    #[test]
    fn display_models_join_model_resources() {
        let (_dir, catalog) = seeded_catalog();
        let models = catalog.display_models(31102).unwrap();
        assert_eq!(models.len(), 2);
        assert!(models.iter().all(|model| model.display_id == 31102));
        assert_eq!(models[0].model.file_name, "helm_cloth_netherwind_hu_m.m2");

        let json = serde_json::to_value(&models[0]).unwrap();
        assert_eq!(json["displayId"], 31102);
        assert_eq!(json["fileId"], 145001);
    }

    #[test]
    fn display_textures_join_texture_files() {
        let (_dir, catalog) = seeded_catalog();
        let textures = catalog.display_textures(31102).unwrap();
        assert_eq!(textures.len(), 1);
        assert_eq!(textures[0].texture.file_name, "helm_cloth_netherwind.blp");
        assert_eq!(textures[0].component_section, 0);
        assert!(catalog.display_textures(99).unwrap().is_empty());
    }

    #[test]
    fn file_lookups_cover_models_textures_and_icons() {
        let (_dir, catalog) = seeded_catalog();
        assert_eq!(
            catalog.model_resource_by_file_id(145000).unwrap().file_name,
            "sword_2h_thunderfury.m2"
        );
        assert_eq!(catalog.texture_by_file_id(200001).unwrap().material_resource_id, 7002);
        assert_eq!(catalog.icon_by_file_id(133076).unwrap().file_name, "inv_helmet_29.blp");

        assert!(matches!(
            catalog.icon_by_file_id(1),
            Err(CatalogError::NotFound { kind: "Icon file", id: 1 })
        ));
        assert_eq!(catalog.search_icons("inv_sword", 5).unwrap().len(), 1);
        assert_eq!(catalog.search_model_resources("netherwind", 5).unwrap().len(), 2);
        assert_eq!(catalog.search_textures("thunderfury", 5).unwrap().len(), 1);
    }

    #[test]
    fn random_lookups_respect_slot_filter() {
        let (_dir, catalog) = seeded_catalog();
        for _ in 0..5 {
            assert_eq!(catalog.random_item(Some(13)).unwrap().inventory_type, 13);
        }
        assert!(catalog.random_item(Some(28)).is_err());
        assert!(catalog.random_model_resource().is_ok());
        assert!(catalog.random_texture().is_ok());
    }

    #[test]
    fn catalog_is_opened_read_only() {
        let (_dir, catalog) = seeded_catalog();
        let result = catalog.with_conn(|conn| conn.execute("DELETE FROM icon_files", []));
        assert!(matches!(result, Err(CatalogError::Query(_))));
    }
}
