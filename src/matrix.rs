//! Oxide-content matrix assembly

use nalgebra::DMatrix;
use tracing::warn;

use crate::error::{RecipeError, Result};
use crate::models::Material;

/// Per-material oxide content: rows follow the target oxide order, columns
/// follow the material order.
#[derive(Debug, Clone, PartialEq)]
pub struct OxideMatrix {
    pub oxides: Vec<String>,
    pub material_names: Vec<String>,
    pub values: DMatrix<f64>,
}

impl OxideMatrix {
    /// Look up every target oxide in every material formula (0 when absent).
    pub fn build<S: AsRef<str>>(materials: &[Material], target_oxides: &[S]) -> Result<Self> {
        if materials.is_empty() {
            return Err(RecipeError::NoMaterialsAvailable);
        }

        let values = DMatrix::from_fn(target_oxides.len(), materials.len(), |i, j| {
            materials[j].formula.get(target_oxides[i].as_ref())
        });

        Ok(OxideMatrix {
            oxides: target_oxides.iter().map(|o| o.as_ref().to_string()).collect(),
            material_names: materials.iter().map(|m| m.name.clone()).collect(),
            values,
        })
    }

    /// Sub-matrix restricted to the given material columns, in that order.
    pub fn select(&self, columns: &[usize]) -> Self {
        OxideMatrix {
            oxides: self.oxides.clone(),
            material_names: columns
                .iter()
                .map(|&j| self.material_names[j].clone())
                .collect(),
            values: self.values.select_columns(columns.iter()),
        }
    }

    /// Numeric rank, using the same tolerance rule as a singular-value
    /// cutoff at `sigma_max * max(rows, cols) * EPS`.
    pub fn rank(&self) -> usize {
        if self.values.is_empty() {
            return 0;
        }
        let dim = self.values.nrows().max(self.values.ncols()) as f64;
        let singular = self.values.clone().svd(false, false).singular_values;
        let tol = singular.max() * dim * f64::EPSILON;
        singular.iter().filter(|&&s| s > tol).count()
    }

    /// Log a warning when the rank is below the oxide count and return
    /// the rank.
    pub fn warn_if_underdetermined(&self) -> usize {
        let rank = self.rank();
        if rank < self.n_oxides() {
            warn!(
                "{}",
                RecipeError::UnderdeterminedSystem {
                    rank,
                    oxides: self.n_oxides(),
                }
            );
        }
        rank
    }

    pub fn n_oxides(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_materials(&self) -> usize {
        self.values.ncols()
    }
}
