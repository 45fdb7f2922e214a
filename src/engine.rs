//! Recipe reconstruction entry points over a catalog and an inventory

use rand::Rng;
use tracing::info;

use crate::chemistry::MolarMassTable;
use crate::error::{RecipeError, Result};
use crate::inventory::{InventoryResolver, InventorySelector, MaterialCatalog, filter_by_inventory};
use crate::matrix::OxideMatrix;
use crate::models::{MaterialSet, OxideComposition, Solution};
use crate::search::{SearchConfig, SearchOptions, find_solutions};
use crate::solver::{RecipeSolver, SolverConfig};

/// Ties the catalog, the inventory and the molar-mass table to the solver
/// and the search.
pub struct RecipeEngine<C, I> {
    catalog: C,
    inventory: I,
    molar_masses: MolarMassTable,
    solver_config: SolverConfig,
    search_config: SearchConfig,
}

impl<C: MaterialCatalog, I: InventoryResolver> RecipeEngine<C, I> {
    pub fn new(catalog: C, inventory: I, molar_masses: MolarMassTable) -> Self {
        RecipeEngine {
            catalog,
            inventory,
            molar_masses,
            solver_config: SolverConfig::default(),
            search_config: SearchConfig::default(),
        }
    }

    pub fn with_solver_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    pub fn with_search_config(mut self, config: SearchConfig) -> Self {
        self.search_config = config;
        self
    }

    /// Catalog materials allowed by the inventory, in catalog order.
    /// Identifiers are compared with the field the inventory resolves to.
    pub fn available_materials(&self, selector: Option<&InventorySelector>) -> Result<MaterialSet> {
        let catalog = self.catalog.list_materials()?;
        let inventory = self.inventory.resolve(selector)?;
        let available = filter_by_inventory(catalog, &inventory, self.inventory.match_by());
        if available.is_empty() {
            return Err(RecipeError::NoMaterialsAvailable);
        }
        info!(materials = available.len(), "resolved inventory");
        Ok(available)
    }

    /// Fit `target` once using every available material.
    pub fn solve_single(
        &self,
        target: &OxideComposition,
        selector: Option<&InventorySelector>,
    ) -> Result<Solution> {
        validate_target(target)?;
        let materials = self.available_materials(selector)?;
        let oxides: Vec<&str> = target.oxides().collect();
        let matrix = OxideMatrix::build(&materials, &oxides)?;

        matrix.warn_if_underdetermined();

        Ok(self.solver().solve(&matrix, target, Some(&materials)))
    }

    /// Ranked alternative recipes for `target`.
    pub fn search<R: Rng + ?Sized>(
        &self,
        target: &OxideComposition,
        options: &SearchOptions,
        selector: Option<&InventorySelector>,
        rng: &mut R,
    ) -> Result<Vec<Solution>> {
        validate_target(target)?;
        validate_options(options)?;
        let materials = self.available_materials(selector)?;
        find_solutions(
            &materials,
            target,
            options,
            &self.solver(),
            &self.search_config,
            rng,
        )
    }

    fn solver(&self) -> RecipeSolver<'_> {
        RecipeSolver::new(&self.molar_masses, self.solver_config.clone())
    }
}

fn validate_target(target: &OxideComposition) -> Result<()> {
    if target.iter().any(|(_, value)| value > 0.0) {
        Ok(())
    } else {
        Err(RecipeError::InvalidComposition(
            "target composition has no positive oxide amounts".to_string(),
        ))
    }
}

fn validate_options(options: &SearchOptions) -> Result<()> {
    if options.error_tolerance.is_finite() && options.error_tolerance >= 0.0 {
        Ok(())
    } else {
        Err(RecipeError::InvalidSearchOptions(format!(
            "error tolerance must be a non-negative number, got {}",
            options.error_tolerance
        )))
    }
}
