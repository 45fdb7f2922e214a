//! Data models for oxide compositions, materials, and solved recipes

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RecipeError, Result};

/// Mapping from oxide symbol to a non-negative amount.
///
/// The same type carries both UMF (molar ratio) and weight-fraction
/// compositions; which one a value holds is fixed by where it came from.
/// Zero entries are kept: they record that an oxide is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>")]
pub struct OxideComposition(BTreeMap<String, f64>);

impl OxideComposition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a composition from `(oxide, value)` pairs.
    ///
    /// Rejects negative or non-finite values and repeated oxide symbols.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut composition = Self::new();
        for (oxide, value) in pairs {
            let oxide = oxide.into();
            if composition.0.contains_key(&oxide) {
                return Err(RecipeError::InvalidComposition(format!(
                    "oxide '{oxide}' given more than once"
                )));
            }
            composition.insert(oxide, value)?;
        }
        Ok(composition)
    }

    /// Set the amount for one oxide, replacing any previous value.
    pub fn insert(&mut self, oxide: impl Into<String>, value: f64) -> Result<()> {
        let oxide = oxide.into();
        if oxide.trim().is_empty() {
            return Err(RecipeError::InvalidComposition(
                "empty oxide symbol".to_string(),
            ));
        }
        if !value.is_finite() || value < 0.0 {
            return Err(RecipeError::InvalidComposition(format!(
                "{oxide} = {value} is not a finite non-negative number"
            )));
        }
        self.0.insert(oxide, value);
        Ok(())
    }

    /// Add to the amount for one oxide. Callers guarantee `amount` is a
    /// finite non-negative number.
    pub(crate) fn accumulate(&mut self, oxide: &str, amount: f64) {
        debug_assert!(amount.is_finite() && amount >= 0.0);
        *self.0.entry(oxide.to_string()).or_insert(0.0) += amount;
    }

    /// Amount of `oxide`, or 0 when absent.
    pub fn get(&self, oxide: &str) -> f64 {
        self.0.get(oxide).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, oxide: &str) -> bool {
        self.0.contains_key(oxide)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(oxide, &value)| (oxide.as_str(), value))
    }

    pub fn oxides(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Multiply every entry by a non-negative finite factor.
    pub fn scaled(&self, factor: f64) -> Self {
        debug_assert!(factor.is_finite() && factor >= 0.0);
        Self(
            self.0
                .iter()
                .map(|(oxide, &value)| (oxide.clone(), value * factor))
                .collect(),
        )
    }

    /// Copy with every value rounded to `decimals` places.
    pub fn rounded(&self, decimals: u32) -> Self {
        Self(
            self.0
                .iter()
                .map(|(oxide, &value)| (oxide.clone(), round_to(value, decimals)))
                .collect(),
        )
    }
}

impl TryFrom<BTreeMap<String, f64>> for OxideComposition {
    type Error = RecipeError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self> {
        Self::from_pairs(map)
    }
}

/// A raw material from the catalog. Formula values are weight percentages
/// and may include a loss-on-ignition (`Loi`) entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub formula: OxideComposition,
    #[serde(default)]
    pub in_inventory: bool,
}

impl Material {
    /// Create a material whose id is derived from its name.
    pub fn new(name: impl Into<String>, formula: OxideComposition) -> Self {
        let name = name.into();
        Material {
            id: slugify(&name),
            name,
            formula,
            in_inventory: true,
        }
    }
}

/// Ordered materials; the order fixes the oxide-matrix column order.
pub type MaterialSet = Vec<Material>;

/// Lower-case, dash-separated identifier derived from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Material name -> weight percentage of the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Recipe(BTreeMap<String, f64>);

impl Recipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, material: impl Into<String>, percent: f64) {
        self.0.insert(material.into(), percent);
    }

    pub fn get(&self, material: &str) -> Option<f64> {
        self.0.get(material).copied()
    }

    pub fn contains(&self, material: &str) -> bool {
        self.0.contains_key(material)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, &percent)| (name.as_str(), percent))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub(crate) fn scale_to(&mut self, total: f64) {
        let current = self.total();
        if current > 0.0 {
            for percent in self.0.values_mut() {
                *percent *= total / current;
            }
        }
    }

    /// Identity used for deduplication: names with percentages rounded to
    /// one decimal place, counted in tenths.
    pub fn dedup_key(&self) -> Vec<(String, i64)> {
        self.0
            .iter()
            .map(|(name, &percent)| (name.clone(), (percent * 10.0).round() as i64))
            .collect()
    }

    pub fn rounded(&self, decimals: u32) -> Self {
        Self(
            self.0
                .iter()
                .map(|(name, &percent)| (name.clone(), round_to(percent, decimals)))
                .collect(),
        )
    }
}

/// Fit quality of a solution: the UMF error, or why no fit was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorScore {
    Value(f64),
    Failed(String),
}

impl ErrorScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            ErrorScore::Value(v) => Some(*v),
            ErrorScore::Failed(_) => None,
        }
    }
}

/// Result of one recipe fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub recipe: Recipe,
    pub error: ErrorScore,
    pub target_composition: OxideComposition,
    pub actual_composition: OxideComposition,
    pub weight_composition: OxideComposition,
    pub materials_count: usize,
}

impl Solution {
    /// A solution that carries no recipe, only the reason it failed.
    pub fn failed(target: &OxideComposition, reason: impl Into<String>) -> Self {
        Solution {
            recipe: Recipe::new(),
            error: ErrorScore::Failed(reason.into()),
            target_composition: target.clone(),
            actual_composition: OxideComposition::new(),
            weight_composition: OxideComposition::new(),
            materials_count: 0,
        }
    }

    /// Whether the solution can take part in ranking.
    pub fn is_viable(&self) -> bool {
        !self.recipe.is_empty() && self.error.value().is_some()
    }

    /// Error value for ranking; failed solutions score as infinitely bad.
    pub fn error_value(&self) -> f64 {
        self.error.value().unwrap_or(f64::INFINITY)
    }

    /// Copy rounded for presentation: recipe and weights to 2 decimals,
    /// UMF to 4.
    pub fn rounded(&self) -> Self {
        Solution {
            recipe: self.recipe.rounded(2),
            error: self.error.clone(),
            target_composition: self.target_composition.clone(),
            actual_composition: self.actual_composition.rounded(4),
            weight_composition: self.weight_composition.rounded(2),
            materials_count: self.materials_count,
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
