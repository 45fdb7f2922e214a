//! Material catalog and inventory providers

use std::collections::BTreeSet;

use crate::error::Result;
use crate::models::{Material, MaterialSet};

/// Source of the full material catalog.
pub trait MaterialCatalog {
    fn list_materials(&self) -> Result<MaterialSet>;
}

impl MaterialCatalog for MaterialSet {
    fn list_materials(&self) -> Result<MaterialSet> {
        Ok(self.clone())
    }
}

/// Which material field inventory identifiers are compared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchBy {
    #[default]
    Name,
    Id,
}

impl MatchBy {
    pub fn key<'m>(&self, material: &'m Material) -> &'m str {
        match self {
            MatchBy::Name => &material.name,
            MatchBy::Id => &material.id,
        }
    }
}

/// Explicit list of materials to use, overriding the stored inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySelector(BTreeSet<String>);

impl InventorySelector {
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InventorySelector(identifiers.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.0.contains(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for InventorySelector {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Decides which catalog materials are available.
pub trait InventoryResolver {
    /// Identifiers of usable materials. An explicit `selector` wins over
    /// the resolver's default inventory.
    fn resolve(&self, selector: Option<&InventorySelector>) -> Result<BTreeSet<String>>;

    /// Material field the resolved identifiers refer to.
    fn match_by(&self) -> MatchBy;
}

/// In-memory inventory with a fixed default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticInventory {
    default: BTreeSet<String>,
    match_by: MatchBy,
}

impl StaticInventory {
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StaticInventory {
            default: identifiers.into_iter().map(Into::into).collect(),
            match_by: MatchBy::Name,
        }
    }

    /// Treat the identifiers as material ids or names.
    pub fn with_match_by(mut self, match_by: MatchBy) -> Self {
        self.match_by = match_by;
        self
    }

    /// Default inventory made of every material flagged `in_inventory`.
    pub fn from_flags(materials: &[Material], match_by: MatchBy) -> Self {
        Self::new(
            materials
                .iter()
                .filter(|m| m.in_inventory)
                .map(|m| match_by.key(m).to_string()),
        )
        .with_match_by(match_by)
    }
}

impl InventoryResolver for StaticInventory {
    fn resolve(&self, selector: Option<&InventorySelector>) -> Result<BTreeSet<String>> {
        Ok(match selector {
            Some(selector) => selector.0.clone(),
            None => self.default.clone(),
        })
    }

    fn match_by(&self) -> MatchBy {
        self.match_by
    }
}

/// Keep catalog materials whose identifier is in `inventory`, in catalog order.
pub fn filter_by_inventory(
    materials: MaterialSet,
    inventory: &BTreeSet<String>,
    match_by: MatchBy,
) -> MaterialSet {
    materials
        .into_iter()
        .filter(|m| inventory.contains(match_by.key(m)))
        .collect()
}
