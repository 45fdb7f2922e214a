//! Recipe analysis: batch recipe to weight composition, UMF and ratios

use serde::Serialize;

use crate::chemistry::{MolarMassTable, R2O};
use crate::error::{RecipeError, Result};
use crate::models::{Material, OxideComposition};
use crate::solver::add_material;

/// Fluxes counted on the RO side of the flux ratios.
const RATIO_RO: &[&str] = &["MgO", "CaO", "SrO", "BaO", "ZnO"];

/// Oxide ratios of a UMF. `None` means the denominator is zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UmfRatios {
    pub silica_alumina: Option<f64>,
    pub r2o_ro: Option<f64>,
    pub ro_r2o: Option<f64>,
}

impl UmfRatios {
    pub fn from_umf(umf: &OxideComposition) -> Self {
        let r2o: f64 = R2O.iter().map(|oxide| umf.get(oxide)).sum();
        let ro: f64 = RATIO_RO.iter().map(|oxide| umf.get(oxide)).sum();
        UmfRatios {
            silica_alumina: ratio(umf.get("SiO2"), umf.get("Al2O3")),
            r2o_ro: ratio(r2o, ro),
            ro_r2o: ratio(ro, r2o),
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

/// Which catalog material an ingredient resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientMatch {
    pub ingredient: String,
    pub amount: f64,
    pub material: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeAnalysis {
    pub weight_composition: OxideComposition,
    pub umf: OxideComposition,
    pub ratios: UmfRatios,
    pub matches: Vec<IngredientMatch>,
}

impl RecipeAnalysis {
    pub fn unmatched(&self) -> impl Iterator<Item = &str> {
        self.matches
            .iter()
            .filter(|m| m.material.is_none())
            .map(|m| m.ingredient.as_str())
    }
}

/// Find the catalog material for an ingredient name: exact match first,
/// then a case-insensitive substring match in either direction.
pub fn match_material<'m>(materials: &'m [Material], ingredient: &str) -> Option<&'m Material> {
    if let Some(exact) = materials.iter().find(|m| m.name == ingredient) {
        return Some(exact);
    }
    let needle = ingredient.to_lowercase();
    materials.iter().find(|m| {
        let name = m.name.to_lowercase();
        name.contains(&needle) || needle.contains(&name)
    })
}

/// Compute the weight composition and UMF a batch recipe produces.
///
/// `ingredients` are `(material name, parts)` pairs; parts need not sum to
/// 100. Ingredients without a catalog match are reported and ignored.
pub fn analyze_recipe(
    materials: &[Material],
    ingredients: &[(String, f64)],
    table: &MolarMassTable,
) -> Result<RecipeAnalysis> {
    let mut weight_composition = OxideComposition::new();
    let mut matches = Vec::with_capacity(ingredients.len());

    for (ingredient, amount) in ingredients {
        if ingredient.trim().is_empty() || !amount.is_finite() || *amount < 0.0 {
            return Err(RecipeError::InvalidComposition(format!(
                "ingredient '{ingredient}' = {amount}"
            )));
        }
        let material = match_material(materials, ingredient);
        if let Some(material) = material {
            add_material(&mut weight_composition, material, *amount);
        }
        matches.push(IngredientMatch {
            ingredient: ingredient.clone(),
            amount: *amount,
            material: material.map(|m| m.name.clone()),
        });
    }

    let umf = table.to_umf(&weight_composition)?;
    Ok(RecipeAnalysis {
        ratios: UmfRatios::from_umf(&umf),
        weight_composition,
        umf,
        matches,
    })
}
