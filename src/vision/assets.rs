//! Asset table: locale-variant button definitions loaded from JSON
//!
//! The file maps button names to per-server rectangles, colours and
//! reference images:
//!
//! ```json
//! {
//!   "ASH_START": {
//!     "area":   {"cn": [1034, 627, 1204, 674], "en": [1034, 627, 1204, 674]},
//!     "color":  {"cn": [98, 123, 206], "en": [98, 123, 206]},
//!     "button": {"cn": [1034, 627, 1204, 674], "en": [1034, 627, 1204, 674]},
//!     "file":   {"cn": "./assets/cn/os_ash/ASH_START.png"}
//!   }
//! }
//! ```
//!
//! Relative image paths are resolved against the directory of the JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::button::{Area, Button, Color};

/// Game server, which selects the asset variant
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Server {
    #[default]
    Cn,
    En,
    Jp,
    Tw,
}

impl std::fmt::Display for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Server::Cn => "cn",
            Server::En => "en",
            Server::Jp => "jp",
            Server::Tw => "tw",
        };
        f.write_str(name)
    }
}

/// Button names referenced by the handlers
pub mod names {
    // Generic combat
    pub const PAUSE: &str = "PAUSE";
    pub const BATTLE_PREPARATION: &str = "BATTLE_PREPARATION";
    pub const BATTLE_STATUS_S: &str = "BATTLE_STATUS_S";
    pub const BATTLE_STATUS_A: &str = "BATTLE_STATUS_A";
    pub const BATTLE_STATUS_B: &str = "BATTLE_STATUS_B";
    pub const GET_ITEMS_1: &str = "GET_ITEMS_1";
    pub const GET_ITEMS_2: &str = "GET_ITEMS_2";
    pub const EXP_INFO_S: &str = "EXP_INFO_S";
    pub const EXP_INFO_A: &str = "EXP_INFO_A";
    pub const EXP_INFO_B: &str = "EXP_INFO_B";

    // Navigation
    pub const BACK_ARROW: &str = "BACK_ARROW";
    pub const IN_MAP: &str = "IN_MAP";

    // Ash beacon
    pub const ASH_COLLECT_STATUS: &str = "ASH_COLLECT_STATUS";
    pub const ASH_DAILY_STATUS: &str = "ASH_DAILY_STATUS";
    pub const ASH_START: &str = "ASH_START";
    pub const BATTLE_STATUS: &str = "BATTLE_STATUS";
    pub const BEACON_REWARD: &str = "BEACON_REWARD";
    pub const BEACON_EMPTY: &str = "BEACON_EMPTY";
}

/// One button with all its server variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonDef {
    pub area: BTreeMap<Server, Area>,
    pub color: BTreeMap<Server, Color>,
    pub button: BTreeMap<Server, Area>,
    #[serde(default)]
    pub file: BTreeMap<Server, PathBuf>,
}

/// All known buttons, read once at startup
#[derive(Debug, Clone, Default)]
pub struct AssetTable {
    defs: BTreeMap<String, ButtonDef>,
    root: Option<PathBuf>,
}

impl AssetTable {
    /// Parse an asset table; relative image paths stay relative
    pub fn from_json_str(json: &str) -> Result<Self, AssetError> {
        let defs = serde_json::from_str(json)?;
        Ok(Self { defs, root: None })
    }

    /// Load an asset table from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut table = Self::from_json_str(&json)?;
        table.root = path.parent().map(Path::to_path_buf);
        log::info!("Loaded {} buttons from {}", table.len(), path.display());
        Ok(table)
    }

    /// Add or replace a definition
    pub fn insert(&mut self, name: impl Into<String>, def: ButtonDef) {
        self.defs.insert(name.into(), def);
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    /// Resolve a button for one server.
    ///
    /// A server missing from a definition falls back to the `cn` variant,
    /// which every exported asset carries.
    pub fn button(&self, name: &str, server: Server) -> Result<Button, AssetError> {
        let def = self
            .defs
            .get(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;

        let pick = |server: Server| -> Option<(Area, Color, Area)> {
            Some((
                *def.area.get(&server)?,
                *def.color.get(&server)?,
                *def.button.get(&server)?,
            ))
        };
        let (area, color, button) = match pick(server) {
            Some(variant) => variant,
            None => {
                log::debug!("{} has no {} variant, using cn", name, server);
                pick(Server::Cn).ok_or_else(|| AssetError::MissingVariant {
                    name: name.to_string(),
                    server,
                })?
            }
        };

        let mut resolved = Button::new(name, area, color, button);
        let file = def.file.get(&server).or_else(|| def.file.get(&Server::Cn));
        if let Some(file) = file {
            resolved.file = Some(match &self.root {
                Some(root) if file.is_relative() => root.join(file),
                _ => file.clone(),
            });
        }
        Ok(resolved)
    }
}

/// Asset loading errors
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Unknown button: {0}")]
    NotFound(String),
    #[error("Button {name} has no {server} or cn variant")]
    MissingVariant { name: String, server: Server },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid asset table: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "ASH_START": {
            "area":   {"cn": [10, 20, 30, 40], "en": [11, 21, 31, 41]},
            "color":  {"cn": [1, 2, 3], "en": [4, 5, 6]},
            "button": {"cn": [10, 20, 30, 40], "en": [11, 21, 31, 41]},
            "file":   {"cn": "./assets/cn/ASH_START.png"}
        },
        "BACK_ARROW": {
            "area":   {"cn": [0, 0, 5, 5]},
            "color":  {"cn": [9, 9, 9]},
            "button": {"cn": [0, 0, 5, 5]}
        }
    }"#;

    #[test]
    fn test_resolve_server_variant() {
        let table = AssetTable::from_json_str(TABLE).unwrap();
        let button = table.button(names::ASH_START, Server::En).unwrap();

        assert_eq!(button.name, "ASH_START");
        assert_eq!(button.area, Area::new(11, 21, 31, 41));
        assert_eq!(button.color, [4, 5, 6]);
        assert_eq!(
            button.file.as_deref(),
            Some(Path::new("./assets/cn/ASH_START.png"))
        );
    }

    #[test]
    fn test_missing_variant_falls_back_to_cn() {
        let table = AssetTable::from_json_str(TABLE).unwrap();
        let button = table.button(names::BACK_ARROW, Server::Jp).unwrap();
        assert_eq!(button.color, [9, 9, 9]);
        assert!(button.file.is_none());
    }

    #[test]
    fn test_unknown_button() {
        let table = AssetTable::from_json_str(TABLE).unwrap();
        assert!(matches!(
            table.button("NOPE", Server::Cn),
            Err(AssetError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_resolves_relative_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buttons.json");
        std::fs::write(&path, TABLE).unwrap();

        let table = AssetTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);
        let button = table.button(names::ASH_START, Server::Cn).unwrap();
        assert_eq!(
            button.file.unwrap(),
            dir.path().join("./assets/cn/ASH_START.png")
        );
    }
}
