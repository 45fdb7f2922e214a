//! JSON material import
//!
//! Walks a directory for `*.json` files. Each file holds one material
//! object or an array of them:
//!
//! ```json
//! [{"name": "Whiting", "formula": {"CaO": 55.4, "Loi": 44.1}}]
//! ```
//!
//! `id` (defaults to a slug of the name) and `in_inventory` (defaults to
//! true) are optional. A file named `molar_masses.json` holds an
//! `{"oxide": molar_mass}` object instead.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::chemistry::LOI;
use crate::db;
use crate::models::{Material, OxideComposition, slugify};

const MOLAR_MASS_FILE: &str = "molar_masses.json";

#[derive(Debug, Deserialize)]
struct MaterialRecord {
    name: String,
    #[serde(default)]
    id: Option<String>,
    formula: BTreeMap<String, f64>,
    #[serde(default = "default_in_inventory")]
    in_inventory: bool,
}

fn default_in_inventory() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MaterialFile {
    Many(Vec<MaterialRecord>),
    One(MaterialRecord),
}

/// Find all *.json files below `dir`
pub fn find_material_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Oxide symbol check: element symbols with optional counts, e.g. `Al2O3`.
struct OxideValidator {
    symbol_re: Regex,
}

impl OxideValidator {
    fn new() -> Result<Self> {
        Ok(OxideValidator {
            symbol_re: Regex::new(r"^(?:[A-Z][a-z]?\d*)+$")?,
        })
    }

    fn is_valid(&self, oxide: &str) -> bool {
        oxide == LOI || self.symbol_re.is_match(oxide)
    }
}

fn build_material(
    record: MaterialRecord,
    validator: &OxideValidator,
    stats: &mut ImportStats,
) -> Result<Material> {
    let mut formula = OxideComposition::new();
    for (oxide, percent) in record.formula {
        if !validator.is_valid(&oxide) {
            warn!(material = %record.name, "skipping unrecognized oxide '{oxide}'");
            stats.skipped_oxides += 1;
            continue;
        }
        if let Err(e) = formula.insert(oxide, percent) {
            warn!(material = %record.name, "skipping entry: {e}");
            stats.skipped_oxides += 1;
        }
    }
    if formula.is_empty() {
        bail!("material '{}' has no usable oxides", record.name);
    }

    Ok(Material {
        id: record.id.unwrap_or_else(|| slugify(&record.name)),
        name: record.name,
        formula,
        in_inventory: record.in_inventory,
    })
}

fn import_materials(
    conn: &Connection,
    path: &Path,
    content: &str,
    validator: &OxideValidator,
    stats: &mut ImportStats,
) -> Result<()> {
    let records = match serde_json::from_str::<MaterialFile>(content)
        .with_context(|| format!("{} is not a material file", path.display()))?
    {
        MaterialFile::Many(records) => records,
        MaterialFile::One(record) => vec![record],
    };

    for record in records {
        match build_material(record, validator, stats) {
            Ok(material) => {
                db::upsert_material(conn, &material)?;
                stats.materials += 1;
            }
            Err(e) => {
                warn!(file = %path.display(), "{e:#}");
                stats.errors += 1;
            }
        }
    }
    Ok(())
}

fn import_molar_masses(
    conn: &Connection,
    content: &str,
    validator: &OxideValidator,
    stats: &mut ImportStats,
) -> Result<()> {
    let masses: BTreeMap<String, f64> = serde_json::from_str(content)?;
    for (oxide, mass) in masses {
        if !validator.is_valid(&oxide) || !mass.is_finite() || mass < 0.0 {
            warn!("skipping molar mass {oxide} = {mass}");
            stats.skipped_oxides += 1;
            continue;
        }
        db::upsert_molar_mass(conn, &oxide, mass)?;
        stats.molar_masses += 1;
    }
    Ok(())
}

/// Import every JSON file below `dir` into the database
pub fn import_directory(conn: &Connection, dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    let validator = OxideValidator::new()?;

    info!("scanning {} for material files", dir.display());
    let files = find_material_files(dir)?;
    info!(files = files.len(), "found material files");

    for path in &files {
        stats.files += 1;
        let result = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))
            .and_then(|content| {
                if path.file_name().is_some_and(|n| n == MOLAR_MASS_FILE) {
                    import_molar_masses(conn, &content, &validator, &mut stats)
                } else {
                    import_materials(conn, path, &content, &validator, &mut stats)
                }
            });
        if let Err(e) = result {
            warn!("error importing {}: {e:#}", path.display());
            stats.errors += 1;
        }
    }

    Ok(stats)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub files: usize,
    pub materials: usize,
    pub molar_masses: usize,
    pub skipped_oxides: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} materials and {} molar masses from {} files. Skipped oxides: {}, Errors: {}",
            self.materials, self.molar_masses, self.files, self.skipped_oxides, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oxide_validator() {
        let v = OxideValidator::new().unwrap();
        for ok in ["SiO2", "Al2O3", "F", "Loi", "U3O8", "CaO"] {
            assert!(v.is_valid(ok), "{ok}");
        }
        for bad in ["sio2", "", "Si O2", "CaO!", "2SiO"] {
            assert!(!v.is_valid(bad), "{bad}");
        }
    }

    #[test]
    fn test_build_material_skips_bad_oxides() {
        let v = OxideValidator::new().unwrap();
        let mut stats = ImportStats::default();
        let record: MaterialRecord = serde_json::from_str(
            r#"{"name": "Red Art", "formula": {"SiO2": 64.0, "iron": 7.0, "Al2O3": -1.0}}"#,
        )
        .unwrap();
        let m = build_material(record, &v, &mut stats).unwrap();
        assert_eq!(m.id, "red-art");
        assert!(m.in_inventory);
        assert_eq!(m.formula.len(), 1);
        assert_eq!(stats.skipped_oxides, 2);
    }
}
