//! Database schema and operations

use std::collections::BTreeSet;

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::chemistry::MolarMassTable;
use crate::error::{RecipeError, Result};
use crate::inventory::{InventoryResolver, InventorySelector, MatchBy, MaterialCatalog};
use crate::models::{Material, MaterialSet, OxideComposition};
use crate::sample::sample_materials;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Raw materials
        CREATE TABLE IF NOT EXISTS materials (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            in_inventory INTEGER NOT NULL DEFAULT 0
        );

        -- Oxide analysis of each material, weight percent
        CREATE TABLE IF NOT EXISTS material_oxides (
            material_id TEXT NOT NULL,
            oxide TEXT NOT NULL,
            percent REAL NOT NULL,
            PRIMARY KEY (material_id, oxide)
        );

        CREATE TABLE IF NOT EXISTS molar_masses (
            oxide TEXT PRIMARY KEY,
            molar_mass REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_materials_inventory ON materials(in_inventory);
        "#,
    )?;
    Ok(())
}

/// Insert or replace a material and its oxide analysis
pub fn upsert_material(conn: &Connection, material: &Material) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM material_oxides
         WHERE material_id IN (SELECT id FROM materials WHERE id = ?1 OR name = ?2)",
        (&material.id, &material.name),
    )?;
    tx.execute(
        "INSERT OR REPLACE INTO materials (id, name, in_inventory) VALUES (?1, ?2, ?3)",
        (&material.id, &material.name, material.in_inventory),
    )?;
    for (oxide, percent) in material.formula.iter() {
        tx.execute(
            "INSERT INTO material_oxides (material_id, oxide, percent) VALUES (?1, ?2, ?3)",
            (&material.id, oxide, percent),
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Remove every material (for re-import)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM material_oxides;
        DELETE FROM materials;
        "#,
    )?;
    Ok(())
}

fn load_formula(conn: &Connection, material_id: &str) -> Result<OxideComposition> {
    let mut stmt = conn.prepare(
        "SELECT oxide, percent FROM material_oxides WHERE material_id = ?1 ORDER BY oxide",
    )?;

    let rows = stmt.query_map([material_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;

    let mut pairs = Vec::new();
    for row in rows {
        pairs.push(row?);
    }
    OxideComposition::from_pairs(pairs)
}

/// List all materials, ordered by name
pub fn list_materials(conn: &Connection) -> Result<MaterialSet> {
    let mut stmt = conn.prepare("SELECT id, name, in_inventory FROM materials ORDER BY name")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, bool>(2)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (id, name, in_inventory) = row?;
        let formula = load_formula(conn, &id)?;
        results.push(Material {
            id,
            name,
            formula,
            in_inventory,
        });
    }
    Ok(results)
}

/// Look up a material by id or name
pub fn get_material(conn: &Connection, identifier: &str) -> Result<Option<Material>> {
    let row = conn
        .query_row(
            "SELECT id, name, in_inventory FROM materials WHERE id = ?1 OR name = ?1",
            [identifier],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, name, in_inventory)) => {
            let formula = load_formula(conn, &id)?;
            Ok(Some(Material {
                id,
                name,
                formula,
                in_inventory,
            }))
        }
        None => Ok(None),
    }
}

/// Mark a material (by id or name) as in or out of the inventory
pub fn set_inventory(conn: &Connection, identifier: &str, in_inventory: bool) -> Result<()> {
    let updated = conn.execute(
        "UPDATE materials SET in_inventory = ?2 WHERE id = ?1 OR name = ?1",
        (identifier, in_inventory),
    )?;
    if updated == 0 {
        return Err(RecipeError::UnknownMaterial(identifier.to_string()));
    }
    Ok(())
}

/// Take every material out of the inventory
pub fn clear_inventory(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("UPDATE materials SET in_inventory = 0", [])?)
}

/// Identifiers of the materials currently in the inventory
pub fn inventory_ids(conn: &Connection, match_by: MatchBy) -> Result<BTreeSet<String>> {
    let column = match match_by {
        MatchBy::Name => "name",
        MatchBy::Id => "id",
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {column} FROM materials WHERE in_inventory = 1"
    ))?;

    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = BTreeSet::new();
    for row in rows {
        results.insert(row?);
    }
    Ok(results)
}

/// Insert or replace one molar mass
pub fn upsert_molar_mass(conn: &Connection, oxide: &str, molar_mass: f64) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO molar_masses (oxide, molar_mass) VALUES (?1, ?2)",
        (oxide, molar_mass),
    )?;
    Ok(())
}

/// Stored molar masses, or the built-in table when none are stored
pub fn load_molar_masses(conn: &Connection) -> Result<MolarMassTable> {
    let mut stmt = conn.prepare("SELECT oxide, molar_mass FROM molar_masses")?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }

    if entries.is_empty() {
        info!("no stored molar masses, using the standard table");
        return Ok(MolarMassTable::standard());
    }
    info!(oxides = entries.len(), "loaded molar masses");
    Ok(MolarMassTable::from_entries(entries))
}

/// Load the built-in sample materials and the standard molar masses.
/// Returns the number of materials written.
pub fn seed_sample_data(conn: &Connection) -> Result<usize> {
    let materials = sample_materials()?;
    for material in &materials {
        upsert_material(conn, material)?;
    }
    for (oxide, mass) in MolarMassTable::standard().iter() {
        upsert_molar_mass(conn, oxide, mass)?;
    }
    info!(materials = materials.len(), "seeded sample catalog");
    Ok(materials.len())
}

/// Material catalog backed by the `materials` tables.
pub struct SqliteCatalog<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteCatalog<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        SqliteCatalog { conn }
    }
}

impl MaterialCatalog for SqliteCatalog<'_> {
    fn list_materials(&self) -> Result<MaterialSet> {
        let materials = list_materials(self.conn)?;
        info!(materials = materials.len(), "loaded catalog");
        Ok(materials)
    }
}

/// Inventory whose default is the set of materials flagged `in_inventory`.
pub struct SqliteInventory<'c> {
    conn: &'c Connection,
    match_by: MatchBy,
}

impl<'c> SqliteInventory<'c> {
    pub fn new(conn: &'c Connection, match_by: MatchBy) -> Self {
        SqliteInventory { conn, match_by }
    }
}

impl InventoryResolver for SqliteInventory<'_> {
    fn resolve(&self, selector: Option<&InventorySelector>) -> Result<BTreeSet<String>> {
        match selector {
            Some(selector) => Ok(selector.iter().map(str::to_string).collect()),
            None => inventory_ids(self.conn, self.match_by),
        }
    }

    fn match_by(&self) -> MatchBy {
        self.match_by
    }
}
