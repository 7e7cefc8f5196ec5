use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_PREVIEW_RACE: i32 = 11;
pub const DEFAULT_PREVIEW_GENDER: i32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewCharacter {
    #[serde(default = "default_preview_race")]
    pub race: i32,
    #[serde(default = "default_preview_gender")]
    pub gender: i32,
    #[serde(default)]
    pub customizations: Vec<Value>,
}

fn default_preview_race() -> i32 {
    DEFAULT_PREVIEW_RACE
}

fn default_preview_gender() -> i32 {
    DEFAULT_PREVIEW_GENDER
}

impl Default for PreviewCharacter {
    fn default() -> Self {
        Self {
            race: DEFAULT_PREVIEW_RACE,
            gender: DEFAULT_PREVIEW_GENDER,
            customizations: Vec::new(),
        }
    }
}

/// The persisted `settings` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(rename = "useDarkMode", default)]
    pub use_dark_mode: bool,
    #[serde(rename = "freedomWoWRootDir", default)]
    pub install_root_dir: String,
    #[serde(rename = "launchWoWAfterPatch", default = "default_launch_after_patch")]
    pub launch_after_patch: bool,
    #[serde(
        rename = "previewCharacter",
        default,
        deserialize_with = "deserialize_preview_character"
    )]
    pub preview_character: PreviewCharacter,
}

fn default_launch_after_patch() -> bool {
    true
}

// A stored `null` must not leave the record without a preview character.
fn deserialize_preview_character<'de, D>(deserializer: D) -> Result<PreviewCharacter, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<PreviewCharacter>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            use_dark_mode: false,
            install_root_dir: String::new(),
            launch_after_patch: default_launch_after_patch(),
            preview_character: PreviewCharacter::default(),
        }
    }
}

impl AppSettings {
    pub fn has_install_dir(&self) -> bool {
        !self.install_root_dir.trim().is_empty()
    }
}
