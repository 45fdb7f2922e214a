//! Single-recipe solver
//!
//! Fits a non-negative blend of materials to a target UMF, turns the fit
//! into a recipe in batch percent, recomputes the composition that recipe
//! actually produces, and scores it against the target.

use nalgebra::DVector;
use tracing::debug;

use crate::chemistry::{MolarMassTable, umf_error};
use crate::error::{RecipeError, Result};
use crate::matrix::OxideMatrix;
use crate::models::{ErrorScore, Material, OxideComposition, Recipe, Solution, round_to};
use crate::nnls::nnls;

/// What happens to batch mass dropped by the display threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncationPolicy {
    /// Keep surviving percentages as fitted; the recipe may sum below 100.
    #[default]
    Preserve,
    /// Rescale surviving percentages so the recipe sums to exactly 100.
    Renormalize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Fitted coefficients below this are treated as unused materials.
    pub noise_epsilon: f64,
    /// Materials at or below this batch percentage are left out of the recipe.
    pub display_threshold: f64,
    pub truncation: TruncationPolicy,
    /// Decimal places kept in the error score.
    pub error_decimals: u32,
    /// NNLS inner-iteration budget; `None` means three times the material count.
    pub max_iterations: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            noise_epsilon: 1e-6,
            display_threshold: 0.1,
            truncation: TruncationPolicy::Preserve,
            error_decimals: 4,
            max_iterations: None,
        }
    }
}

pub struct RecipeSolver<'a> {
    molar_masses: &'a MolarMassTable,
    config: SolverConfig,
}

impl<'a> RecipeSolver<'a> {
    pub fn new(molar_masses: &'a MolarMassTable, config: SolverConfig) -> Self {
        RecipeSolver {
            molar_masses,
            config,
        }
    }

    /// Fit `target` with the materials of `matrix`.
    ///
    /// With a `catalog`, the achieved composition is recomputed from the full
    /// formulas of the recipe's materials. Without one it is taken from the
    /// matrix columns, which only cover the target oxides and still include
    /// mass the display threshold dropped.
    ///
    /// Never fails: a failed fit comes back as a solution with an empty
    /// recipe and an [`ErrorScore::Failed`] reason.
    pub fn solve(
        &self,
        matrix: &OxideMatrix,
        target: &OxideComposition,
        catalog: Option<&[Material]>,
    ) -> Solution {
        match self.try_solve(matrix, target, catalog) {
            Ok(solution) => solution,
            Err(e) => {
                debug!(materials = matrix.n_materials(), "fit failed: {e}");
                Solution::failed(target, e.to_string())
            }
        }
    }

    fn try_solve(
        &self,
        matrix: &OxideMatrix,
        target: &OxideComposition,
        catalog: Option<&[Material]>,
    ) -> Result<Solution> {
        let target_weights = self.molar_masses.to_weight_fraction(target)?;
        let b = DVector::from_iterator(
            matrix.n_oxides(),
            matrix.oxides.iter().map(|oxide| target_weights.get(oxide)),
        );

        let fit = nnls(&matrix.values, &b, self.config.max_iterations)
            .map_err(|e| RecipeError::SolverFailure(e.to_string()))?;

        let mut x = fit.x;
        let eps = self.config.noise_epsilon;
        x.apply(|v| {
            if *v < eps {
                *v = 0.0;
            }
        });

        let sum = x.sum();
        if sum <= 0.0 {
            return Err(RecipeError::DegenerateFit);
        }
        x *= 100.0 / sum;

        let mut recipe = Recipe::new();
        for (name, &percent) in matrix.material_names.iter().zip(x.iter()) {
            if percent > self.config.display_threshold {
                recipe.insert(name.clone(), percent);
            }
        }
        if self.config.truncation == TruncationPolicy::Renormalize {
            recipe.scale_to(100.0);
        }

        let weight_composition = match catalog {
            Some(materials) => recipe_weight_composition(materials, &recipe),
            None => matrix_weight_composition(matrix, &x),
        };

        let actual = self.molar_masses.to_umf(&weight_composition)?;
        let actual = rescale_to_anchor(target, actual);
        let error = round_to(umf_error(target, &actual), self.config.error_decimals);

        Ok(Solution {
            materials_count: recipe.len(),
            recipe,
            error: ErrorScore::Value(error),
            target_composition: target.clone(),
            actual_composition: actual,
            weight_composition,
        })
    }
}

/// Weight composition of a recipe, summed from full material formulas.
/// Recipe entries without a catalog material contribute nothing.
pub fn recipe_weight_composition(materials: &[Material], recipe: &Recipe) -> OxideComposition {
    let mut composition = OxideComposition::new();
    for (name, percent) in recipe.iter() {
        if let Some(material) = materials.iter().find(|m| m.name == name) {
            add_material(&mut composition, material, percent);
        }
    }
    composition
}

/// Add `percent` parts of `material` per 100 parts of batch.
pub(crate) fn add_material(composition: &mut OxideComposition, material: &Material, percent: f64) {
    for (oxide, content) in material.formula.iter() {
        composition.accumulate(oxide, content * percent / 100.0);
    }
}

/// Weight composition over the matrix oxides for batch percentages `x`.
fn matrix_weight_composition(matrix: &OxideMatrix, x: &DVector<f64>) -> OxideComposition {
    let mut composition = OxideComposition::new();
    for (i, oxide) in matrix.oxides.iter().enumerate() {
        let amount: f64 = x
            .iter()
            .enumerate()
            .filter(|&(_, &pct)| pct > 0.0)
            .map(|(j, &pct)| matrix.values[(i, j)] * pct / 100.0)
            .sum();
        composition.accumulate(oxide, amount);
    }
    composition
}

/// Oxide used to put an achieved UMF on the target's scale.
///
/// Prefers the smallest positive target oxide; if the achieved composition
/// has none of it, takes the first oxide positive in both. An oxide only
/// qualifies when `target / actual` is a finite factor.
pub fn anchor_oxide<'t>(
    target: &'t OxideComposition,
    actual: &OxideComposition,
) -> Option<&'t str> {
    let usable = |oxide: &str, value: f64| {
        let achieved = actual.get(oxide);
        achieved > 0.0 && (value / achieved).is_finite()
    };

    let smallest = target
        .iter()
        .filter(|&(_, value)| value > 0.0)
        .fold(None, |best: Option<(&str, f64)>, (oxide, value)| match best {
            Some((_, best_value)) if best_value <= value => best,
            _ => Some((oxide, value)),
        });

    if let Some((oxide, value)) = smallest {
        if usable(oxide, value) {
            return Some(oxide);
        }
    }

    target
        .iter()
        .find(|&(oxide, value)| value > 0.0 && usable(oxide, value))
        .map(|(oxide, _)| oxide)
}

/// Scale `actual` so its anchor oxide equals the target's. Left unchanged
/// when no anchor exists.
pub fn rescale_to_anchor(target: &OxideComposition, actual: OxideComposition) -> OxideComposition {
    match anchor_oxide(target, &actual) {
        Some(oxide) => actual.scaled(target.get(oxide) / actual.get(oxide)),
        None => actual,
    }
}
