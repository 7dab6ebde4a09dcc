//! Variable name tables
//!
//! Serafin files only store the 16-character display name of each variable,
//! in whichever language the simulation was run. Tools refer to variables by
//! short canonical ids (`U`, `V`, `H`, ...) instead, so every name is looked up
//! in a table keyed by language and mesh dimensionality.
//!
//! The tables are embedded CSV resources parsed once on first use and never
//! modified afterwards, so they are safe to share between sessions.
//!
//! ```rust
//! # use serafin::header::{Language, resolve_id};
//! assert_eq!(resolve_id("VELOCITY U", Language::En, true), Some("U"));
//! assert_eq!(resolve_id("VITESSE U", Language::Fr, true), Some("U"));
//! assert_eq!(resolve_id("NOT A VARIABLE", Language::En, true), None);
//! ```

// standard library
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

// internal modules
use crate::utils::f;

// external crates
use log::{error, warn};
use serde::{Deserialize, Serialize};

/// Language of the variable names written in a file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Language {
    /// French names, e.g. `VITESSE U`
    Fr,
    /// English names, e.g. `VELOCITY U`
    #[default]
    En,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fr" | "french" => Ok(Self::Fr),
            "en" | "english" => Ok(Self::En),
            _ => Err(f!("unknown language \"{s}\", expected 'fr' or 'en'")),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Fr => write!(f, "fr"),
            Self::En => write!(f, "en"),
        }
    }
}

/// One record of an `id;name_fr;name_en;unit` table
#[derive(Debug, Deserialize)]
struct Row {
    id: String,
    name_fr: String,
    name_en: String,
    unit: String,
}

/// Id and unit registered for a name
#[derive(Debug, Clone)]
struct Entry {
    id: String,
    unit: String,
}

/// Name to id mappings for one dimensionality
#[derive(Debug, Default)]
struct NameTable {
    fr: HashMap<String, Entry>,
    en: HashMap<String, Entry>,
}

impl NameTable {
    /// Parse a `;` separated table with an `id;name_fr;name_en;unit` header
    ///
    /// Every record needs all four fields, the unit may be empty.
    fn from_csv(content: &str) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(content.as_bytes());

        let mut table = Self::default();
        for row in reader.deserialize() {
            let row: Row = row?;
            let entry = Entry {
                id: row.id,
                unit: row.unit,
            };
            table.fr.insert(row.name_fr, entry.clone());
            table.en.insert(row.name_en, entry);
        }
        Ok(table)
    }

    /// Embedded table, empty if it can not be parsed
    fn embedded(content: &str, label: &str) -> Self {
        Self::from_csv(content).unwrap_or_else(|e| {
            error!("The {label} variable table is malformed, no name will resolve: {e}");
            Self::default()
        })
    }

    fn get(&self, name: &str, language: Language) -> Option<&Entry> {
        match language {
            Language::Fr => self.fr.get(name),
            Language::En => self.en.get(name),
        }
    }
}

const TABLE_2D: &str = include_str!("../../data/variables_2d.csv");
const TABLE_3D: &str = include_str!("../../data/variables_3d.csv");

static VARIABLES_2D: LazyLock<NameTable> = LazyLock::new(|| NameTable::embedded(TABLE_2D, "2D"));

static VARIABLES_3D: LazyLock<NameTable> = LazyLock::new(|| NameTable::embedded(TABLE_3D, "3D"));

fn table(is_2d: bool) -> &'static NameTable {
    match is_2d {
        true => &VARIABLES_2D,
        false => &VARIABLES_3D,
    }
}

/// Canonical id of a registered variable name, if there is one
///
/// The name is trimmed before the lookup.
pub fn resolve_id(name: &str, language: Language, is_2d: bool) -> Option<&'static str> {
    table(is_2d)
        .get(name.trim(), language)
        .map(|entry| entry.id.as_str())
}

/// Registered unit for a variable name, if there is one
pub fn registered_unit(name: &str, language: Language, is_2d: bool) -> Option<&'static str> {
    table(is_2d)
        .get(name.trim(), language)
        .map(|entry| entry.unit.as_str())
}

/// Id used to address a variable in a file
///
/// Falls back to the trimmed name itself when the name is not registered, in
/// which case a warning is logged.
pub fn variable_id(name: &str, language: Language, is_2d: bool) -> String {
    match resolve_id(name, language, is_2d) {
        Some(id) => id.to_string(),
        None => {
            let name = name.trim();
            warn!(
                "The variable name \"{name}\" is not known, the complete name will be used as ID"
            );
            name.to_string()
        }
    }
}
