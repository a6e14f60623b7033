#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! TOML-backed level catalog for Algorun.
//!
//! Catalogs list levels in play order. Each entry names its map as rows of
//! tile codes, the start pose, per-subroutine capacities and, optionally, the
//! subroutines commands may call.

use std::{collections::HashSet, fs, path::Path};

use algorun_core::{Cursor, Level, LevelKey, LevelProvider, Subroutine, Tile, SUBROUTINE_COUNT};
use anyhow::{Context, Result as AnyResult};
use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// Catalog format version understood by this crate.
pub const SUPPORTED_CATALOG_VERSION: u32 = 1;

const BUILTIN_CATALOG: &str = include_str!("../assets/levels.toml");

/// Errors raised while reading a level catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document is not valid TOML or does not match the catalog layout.
    #[error("failed to parse level catalog")]
    Parse(#[from] toml::de::Error),
    /// The document declares a format version this crate cannot read.
    #[error("unsupported level catalog version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version declared by the document.
        found: u32,
        /// Version this crate reads.
        expected: u32,
    },
    /// A map cell holds a code that names no tile.
    #[error("level `{key}` uses unknown tile code {code}")]
    UnknownTile {
        /// Level containing the cell.
        key: String,
        /// Offending code.
        code: u8,
    },
    /// `enabled_functions` names something other than F1 to F3.
    #[error("level `{key}` enables unknown subroutine `{name}`")]
    UnknownSubroutine {
        /// Level containing the entry.
        key: String,
        /// Offending name.
        name: String,
    },
    /// `max_commands` lists more capacities than there are subroutines.
    #[error(
        "level `{key}` lists {count} capacities but only {} subroutines exist",
        SUBROUTINE_COUNT
    )]
    TooManyCapacities {
        /// Level containing the list.
        key: String,
        /// Number of capacities listed.
        count: usize,
    },
    /// Two levels share a key.
    #[error("level key `{key}` appears more than once")]
    DuplicateKey {
        /// Repeated key.
        key: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    version: u32,
    #[serde(default)]
    levels: Vec<LevelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelEntry {
    key: String,
    #[serde(default)]
    description: String,
    map: Vec<Vec<u8>>,
    start: Cursor,
    max_commands: Vec<usize>,
    #[serde(default)]
    enabled_functions: Option<Vec<String>>,
}

impl LevelEntry {
    fn into_level(self) -> Result<(LevelKey, Level), CatalogError> {
        let Self {
            key,
            description,
            map,
            start,
            max_commands,
            enabled_functions,
        } = self;

        let mut grid = Vec::with_capacity(map.len());
        for row in map {
            let mut tiles = Vec::with_capacity(row.len());
            for code in row {
                let tile = Tile::from_code(code).ok_or_else(|| CatalogError::UnknownTile {
                    key: key.clone(),
                    code,
                })?;
                tiles.push(tile);
            }
            grid.push(tiles);
        }

        if max_commands.len() > SUBROUTINE_COUNT {
            return Err(CatalogError::TooManyCapacities {
                key,
                count: max_commands.len(),
            });
        }
        // Subroutines left out of the list get no slots.
        let mut capacities = [0; SUBROUTINE_COUNT];
        for (slot, capacity) in capacities.iter_mut().zip(max_commands) {
            *slot = capacity;
        }

        let mut level = Level::new(grid, start, capacities).with_description(description);
        if let Some(names) = enabled_functions {
            let mut enabled = Vec::with_capacity(names.len());
            for name in names {
                let Some(subroutine) = Subroutine::from_label(&name) else {
                    return Err(CatalogError::UnknownSubroutine { key, name });
                };
                enabled.push(subroutine);
            }
            level = level.with_enabled_subroutines(enabled);
        }

        Ok((LevelKey::new(key), level))
    }
}

/// Ordered collection of levels read from a catalog document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelCatalog {
    levels: Vec<(LevelKey, Level)>,
}

impl LevelCatalog {
    /// Catalog compiled into the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Parses a catalog from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(contents)?;
        if file.version != SUPPORTED_CATALOG_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                found: file.version,
                expected: SUPPORTED_CATALOG_VERSION,
            });
        }

        let mut seen = HashSet::with_capacity(file.levels.len());
        let mut levels = Vec::with_capacity(file.levels.len());
        for entry in file.levels {
            if !seen.insert(entry.key.clone()) {
                return Err(CatalogError::DuplicateKey { key: entry.key });
            }
            levels.push(entry.into_level()?);
        }

        debug!("parsed level catalog with {} levels", levels.len());
        Ok(Self { levels })
    }

    /// Reads and parses the catalog stored at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> AnyResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read level catalog at {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid level catalog at {}", path.display()))
    }

    /// Number of levels in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Reports whether the catalog holds no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl LevelProvider for LevelCatalog {
    fn level_keys(&self) -> Vec<LevelKey> {
        self.levels.iter().map(|(key, _)| key.clone()).collect()
    }

    fn level(&self, key: &LevelKey) -> Option<Level> {
        self.levels
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, level)| level.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use algorun_core::{Color, Direction};

    #[test]
    fn entry_converts_codes_and_pads_capacities() {
        let catalog = LevelCatalog::from_toml_str(
            r#"
                version = 1

                [[levels]]
                key = "colors"
                map = [[1, 2, 3], [4, 0, 9]]
                start = { x = 1, y = 0, dir = "down" }
                max_commands = [3]
            "#,
        )
        .expect("catalog should parse");

        let level = catalog
            .level(&LevelKey::new("colors"))
            .expect("level should be stored under its key");
        assert_eq!(level.tile_at(1, 0), Tile::Path(Color::Green));
        assert_eq!(level.tile_at(0, 1), Tile::Path(Color::Blue));
        assert_eq!(level.tile_at(2, 1), Tile::Goal);
        assert_eq!(level.start(), Cursor::new(1, 0, Direction::Down));
        assert_eq!(level.max_commands(), [3, 0, 0]);
        assert!(level.is_enabled(Subroutine::F3), "no list enables every subroutine");
        assert!(level.description().is_empty());
    }

    #[test]
    fn unknown_tile_codes_are_rejected() {
        let result = LevelCatalog::from_toml_str(
            r#"
                version = 1

                [[levels]]
                key = "broken"
                map = [[1, 5]]
                start = { x = 0, y = 0, dir = "up" }
                max_commands = [1, 0, 0]
            "#,
        );

        assert!(matches!(
            result,
            Err(CatalogError::UnknownTile { ref key, code: 5 }) if key == "broken"
        ));
    }

    #[test]
    fn unsupported_versions_are_rejected() {
        let result = LevelCatalog::from_toml_str("version = 2\n");
        assert!(matches!(
            result,
            Err(CatalogError::UnsupportedVersion {
                found: 2,
                expected: 1
            })
        ));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let level = r#"
            [[levels]]
            key = "twice"
            map = [[9]]
            start = { x = 0, y = 0, dir = "up" }
            max_commands = [1, 0, 0]
        "#;
        let document = format!("version = 1\n{level}{level}");

        assert!(matches!(
            LevelCatalog::from_toml_str(&document),
            Err(CatalogError::DuplicateKey { ref key }) if key == "twice"
        ));
    }

    #[test]
    fn enabled_functions_must_name_subroutines() {
        let result = LevelCatalog::from_toml_str(
            r#"
                version = 1

                [[levels]]
                key = "calls"
                map = [[1, 9]]
                start = { x = 0, y = 0, dir = "right" }
                max_commands = [1, 1, 0]
                enabled_functions = ["F1", "F4"]
            "#,
        );

        assert!(matches!(
            result,
            Err(CatalogError::UnknownSubroutine { ref name, .. }) if name == "F4"
        ));
    }

    #[test]
    fn too_many_capacities_are_rejected() {
        let result = LevelCatalog::from_toml_str(
            r#"
                version = 1

                [[levels]]
                key = "greedy"
                map = [[9]]
                start = { x = 0, y = 0, dir = "up" }
                max_commands = [1, 1, 1, 1]
            "#,
        );

        assert!(matches!(
            result,
            Err(CatalogError::TooManyCapacities { count: 4, .. })
        ));
    }

    #[test]
    fn malformed_documents_report_parse_errors() {
        let result = LevelCatalog::from_toml_str("version = 1\n[[levels]]\nkey = 3\n");
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[test]
    fn from_path_reports_missing_files() {
        let error = LevelCatalog::from_path("does/not/exist.toml")
            .expect_err("missing catalog must fail");
        assert!(error.to_string().contains("does/not/exist.toml"));
    }
}
