//! Content tables referenced by rosters, skills and loot.

use crate::errors::{DataError, DataResult, LoadError};
use combat_schema::{
    EnemyRef, EnemyTemplate, EquipmentData, EquipmentRef, ItemData, ItemRef, LootDrop, SkillData,
    SkillRef,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Something a defeated enemy dropped, resolved to a full object where possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DroppedItem {
    Item(ItemData),
    Equipment(EquipmentData),
    /// An id found in neither table; handed to the caller as-is.
    Unknown(String),
}

impl DroppedItem {
    pub fn id(&self) -> &str {
        match self {
            DroppedItem::Item(item) => &item.id,
            DroppedItem::Equipment(equipment) => &equipment.id,
            DroppedItem::Unknown(id) => id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GameData {
    pub skills: HashMap<String, SkillData>,
    pub items: HashMap<String, ItemData>,
    pub equipment: HashMap<String, EquipmentData>,
    pub enemies: HashMap<String, EnemyTemplate>,
}

impl GameData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every table from RON files in the data directory, one entry per file.
    pub fn load_all(data_path: &Path) -> Result<Self, LoadError> {
        Ok(Self {
            skills: load_table(&data_path.join("skills"), |s: &SkillData| s.id.clone())?,
            items: load_table(&data_path.join("items"), |i: &ItemData| i.id.clone())?,
            equipment: load_table(&data_path.join("equipment"), |e: &EquipmentData| {
                e.id.clone()
            })?,
            enemies: load_table(&data_path.join("enemies"), |e: &EnemyTemplate| e.id.clone())?,
        })
    }

    pub fn with_skill(mut self, skill: SkillData) -> Self {
        self.skills.insert(skill.id.clone(), skill);
        self
    }

    pub fn with_item(mut self, item: ItemData) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    pub fn with_equipment(mut self, equipment: EquipmentData) -> Self {
        self.equipment.insert(equipment.id.clone(), equipment);
        self
    }

    pub fn with_enemy(mut self, enemy: EnemyTemplate) -> Self {
        self.enemies.insert(enemy.id.clone(), enemy);
        self
    }

    pub fn resolve_skill(&self, skill: &SkillRef) -> DataResult<SkillData> {
        match skill {
            SkillRef::Inline(data) => Ok(data.clone()),
            SkillRef::Id(id) => self
                .skills
                .get(id)
                .cloned()
                .ok_or_else(|| DataError::SkillNotFound(id.clone())),
        }
    }

    pub fn resolve_item(&self, item: &ItemRef) -> DataResult<ItemData> {
        match item {
            ItemRef::Inline(data) => Ok(data.clone()),
            ItemRef::Id(id) => self
                .items
                .get(id)
                .cloned()
                .ok_or_else(|| DataError::ItemNotFound(id.clone())),
        }
    }

    pub fn resolve_equipment(&self, equipment: &EquipmentRef) -> DataResult<EquipmentData> {
        match equipment {
            EquipmentRef::Inline(data) => Ok(data.clone()),
            EquipmentRef::Id(id) => self
                .equipment
                .get(id)
                .cloned()
                .ok_or_else(|| DataError::EquipmentNotFound(id.clone())),
        }
    }

    pub fn resolve_enemy(&self, enemy: &EnemyRef) -> DataResult<EnemyTemplate> {
        match enemy {
            EnemyRef::Inline(template) => Ok(template.clone()),
            EnemyRef::Id(id) => self
                .enemies
                .get(id)
                .cloned()
                .ok_or_else(|| DataError::EnemyNotFound(id.clone())),
        }
    }

    /// Item table first, then equipment. Unknown ids are kept rather than dropped.
    pub fn resolve_drop(&self, drop: &LootDrop) -> DroppedItem {
        match drop {
            LootDrop::Item(item) => DroppedItem::Item(item.clone()),
            LootDrop::Equipment(equipment) => DroppedItem::Equipment(equipment.clone()),
            LootDrop::Id(id) => {
                if let Some(item) = self.items.get(id) {
                    DroppedItem::Item(item.clone())
                } else if let Some(equipment) = self.equipment.get(id) {
                    DroppedItem::Equipment(equipment.clone())
                } else {
                    DroppedItem::Unknown(id.clone())
                }
            }
        }
    }
}

fn load_table<T, F>(dir: &Path, id_of: F) -> Result<HashMap<String, T>, LoadError>
where
    T: DeserializeOwned,
    F: Fn(&T) -> String,
{
    let mut table = HashMap::new();

    if !dir.exists() {
        debug!("Content directory {} not found, table left empty", dir.display());
        return Ok(table);
    }

    let io_err = |source| LoadError::Io {
        path: dir.display().to_string(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();

        if path.extension().and_then(|s| s.to_str()) != Some("ron") {
            continue;
        }

        let content = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let value: T = ron::from_str(&content).map_err(|source| LoadError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        table.insert(id_of(&value), value);
    }

    debug!("Loaded {} entries from {}", table.len(), dir.display());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_schema::ItemEffectType;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn potion() -> ItemData {
        ItemData {
            id: "potion".to_string(),
            name: "Potion".to_string(),
            effect_type: ItemEffectType::RestoreHpPercent,
            value: 0.3,
            stat: None,
            duration: None,
            quality: None,
            description: String::new(),
        }
    }

    #[test]
    fn test_resolve_drop_prefers_item_table_then_equipment() {
        let data = GameData::new().with_item(potion()).with_equipment(EquipmentData {
            id: "iron_sword".to_string(),
            name: "Iron Sword".to_string(),
            atk_type: None,
            quality: None,
            description: String::new(),
        });

        assert_eq!(data.resolve_drop(&LootDrop::Id("potion".into())), DroppedItem::Item(potion()));
        assert!(matches!(
            data.resolve_drop(&LootDrop::Id("iron_sword".into())),
            DroppedItem::Equipment(_)
        ));
        assert_eq!(
            data.resolve_drop(&LootDrop::Id("mystery".into())),
            DroppedItem::Unknown("mystery".to_string())
        );
    }

    #[test]
    fn test_missing_skill_is_a_data_error() {
        let data = GameData::new();
        assert_eq!(
            data.resolve_skill(&SkillRef::from("fireball")),
            Err(DataError::SkillNotFound("fireball".to_string()))
        );
    }

    #[test]
    fn test_bundled_content_loads() {
        let data_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data");
        let data = GameData::load_all(&data_path).unwrap();

        assert!(data.skills.contains_key("fireball"));
        assert!(data.items.contains_key("potion"));
        assert!(data.enemies.contains_key("slime"));
        assert!(data.equipment.contains_key("oak_staff"));
    }

    #[test]
    fn test_missing_directory_is_empty_table() {
        let data = GameData::load_all(Path::new("/nonexistent/content")).unwrap();
        assert!(data.skills.is_empty());
        assert!(data.enemies.is_empty());
    }
}
