//! Randomized multi-solution search
//!
//! Starts from a fit over every usable material, then samples material
//! subsets to find alternative recipes. With `prefer_min_materials` the
//! search first concentrates on small subsets with a size-dependent error
//! allowance; a broader pass fills up the candidate pool when too few
//! alternatives turned up.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::index;
use tracing::debug;

use crate::error::Result;
use crate::matrix::OxideMatrix;
use crate::models::{Material, OxideComposition, Solution};
use crate::ranking::rank_solutions;
use crate::solver::RecipeSolver;

/// Caller-facing search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub max_solutions: usize,
    pub prefer_min_materials: bool,
    /// Relative error allowance for small-subset candidates.
    pub error_tolerance: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            max_solutions: 3,
            prefer_min_materials: false,
            error_tolerance: 0.01,
        }
    }
}

/// Budgets and bounds of the subset search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Smallest subset size ever tried.
    pub min_subset_floor: usize,
    /// Subsets may be this many materials smaller than the oxide count.
    pub oxide_slack: usize,
    /// Number of subset sizes covered by the preferred pass.
    pub preferred_size_window: usize,
    pub attempts_cap: usize,
    pub attempts_per_material: usize,
    /// Catalog size below which the tolerance scaling treats the catalog as this big.
    pub effective_catalog_floor: usize,
    /// Extra tolerance per material a subset is below the (effective) catalog size.
    pub tolerance_step: f64,
    /// Subsets in the broad pass stay below this size.
    pub broad_size_cap: usize,
    pub broad_attempts_cap: usize,
    /// Broad-pass candidates may reach this multiple of the base error.
    pub broad_error_factor: f64,
    /// The broad pass stops at this multiple of the requested solution count.
    pub headroom_factor: usize,
    /// How far below the minimum subset size a subset's rank may fall.
    pub rank_slack: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            min_subset_floor: 3,
            oxide_slack: 3,
            preferred_size_window: 5,
            attempts_cap: 200,
            attempts_per_material: 3,
            effective_catalog_floor: 6,
            tolerance_step: 0.05,
            broad_size_cap: 12,
            broad_attempts_cap: 30,
            broad_error_factor: 3.0,
            headroom_factor: 2,
            rank_slack: 1,
        }
    }
}

impl SearchConfig {
    /// Smallest subset size considered for a target with `n_oxides` oxides.
    pub fn min_required(&self, n_oxides: usize) -> usize {
        self.min_subset_floor
            .max(n_oxides.saturating_sub(self.oxide_slack))
    }

    /// Relative error allowance for a preferred-pass subset of `size` materials.
    pub fn size_tolerance(&self, error_tolerance: f64, n_materials: usize, size: usize) -> f64 {
        let effective = n_materials.max(self.effective_catalog_floor) as f64;
        error_tolerance * (1.0 + (effective - size as f64) * self.tolerance_step)
    }
}

/// Subset bookkeeping shared by both passes.
struct SubsetSampler<'a> {
    materials: &'a [Material],
    matrix: &'a OxideMatrix,
    tried: HashSet<Vec<usize>>,
}

impl<'a> SubsetSampler<'a> {
    /// Draw a subset not tried before, or `None` when the draw repeats one.
    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R, size: usize) -> Option<Vec<usize>> {
        let mut subset = index::sample(rng, self.materials.len(), size).into_vec();
        subset.sort_unstable();
        if self.tried.insert(subset.clone()) {
            Some(subset)
        } else {
            None
        }
    }

    fn solve(&self, solver: &RecipeSolver, target: &OxideComposition, subset: &[usize]) -> Solution {
        let matrix = self.matrix.select(subset);
        let materials: Vec<Material> = subset.iter().map(|&j| self.materials[j].clone()).collect();
        solver.solve(&matrix, target, Some(&materials))
    }
}

/// Search for up to `options.max_solutions` ranked recipes for `target`.
///
/// Fails only when `materials` is empty; individual fits that fail are
/// left out of the candidate pool.
pub fn find_solutions<R: Rng + ?Sized>(
    materials: &[Material],
    target: &OxideComposition,
    options: &SearchOptions,
    solver: &RecipeSolver,
    config: &SearchConfig,
    rng: &mut R,
) -> Result<Vec<Solution>> {
    let oxides: Vec<&str> = target.oxides().collect();
    let matrix = OxideMatrix::build(materials, &oxides)?;
    let n = materials.len();

    matrix.warn_if_underdetermined();

    let base = solver.solve(&matrix, target, Some(materials));
    let base_error = base.error_value();
    debug!(error = base_error, materials = n, "base solution");

    let mut candidates = Vec::new();
    if base.is_viable() {
        candidates.push(base);
    }

    let mut sampler = SubsetSampler {
        materials,
        matrix: &matrix,
        tried: HashSet::new(),
    };
    let min_required = config.min_required(oxides.len());

    if options.prefer_min_materials {
        let upper = n.min(min_required + config.preferred_size_window);
        let attempts = config.attempts_cap.min(config.attempts_per_material * n);
        let min_rank = min_required.saturating_sub(config.rank_slack);

        for size in min_required..upper {
            debug!(size, attempts, "searching small subsets");
            let allowance = config.size_tolerance(options.error_tolerance, n, size);
            for _ in 0..attempts {
                let Some(subset) = sampler.draw(rng, size) else {
                    continue;
                };
                if matrix.select(&subset).rank() < min_rank {
                    continue;
                }
                let solution = sampler.solve(solver, target, &subset);
                if solution.is_viable() && solution.error_value() <= base_error * (1.0 + allowance) {
                    debug!(
                        materials = solution.materials_count,
                        error = solution.error_value(),
                        "accepted candidate"
                    );
                    candidates.push(solution);
                }
            }
        }
    }

    if candidates.len() < options.max_solutions {
        let upper = n.min(config.broad_size_cap);
        let attempts = config.broad_attempts_cap.min(n);
        let limit = config.headroom_factor * options.max_solutions;

        'sizes: for size in min_required..upper {
            debug!(size, attempts, "broad subset search");
            for _ in 0..attempts {
                let Some(subset) = sampler.draw(rng, size) else {
                    continue;
                };
                let solution = sampler.solve(solver, target, &subset);
                if solution.is_viable()
                    && solution.error_value() <= base_error * config.broad_error_factor
                {
                    candidates.push(solution);
                    if candidates.len() >= limit {
                        break 'sizes;
                    }
                }
            }
        }
    }

    debug!(
        candidates = candidates.len(),
        subsets = sampler.tried.len(),
        "ranking candidates"
    );
    Ok(rank_solutions(
        candidates,
        options.max_solutions,
        options.prefer_min_materials,
    ))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::chemistry::MolarMassTable;
    use crate::error::RecipeError;
    use crate::solver::SolverConfig;

    fn material(name: &str, pairs: &[(&str, f64)]) -> Material {
        Material::new(name, OxideComposition::from_pairs(pairs.iter().copied()).unwrap())
    }

    #[test]
    fn test_min_required() {
        let config = SearchConfig::default();
        assert_eq!(config.min_required(2), 3);
        assert_eq!(config.min_required(6), 3);
        assert_eq!(config.min_required(10), 7);
    }

    #[test]
    fn test_size_tolerance_grows_for_small_subsets() {
        let config = SearchConfig::default();
        let small = config.size_tolerance(0.1, 4, 3);
        let large = config.size_tolerance(0.1, 4, 5);
        assert!((small - 0.1 * 1.15).abs() < 1e-12);
        assert!(small > large);
        assert!((config.size_tolerance(0.1, 13, 7) - 0.1 * 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_empty_material_set_is_an_error() {
        let table = MolarMassTable::standard();
        let solver = RecipeSolver::new(&table, SolverConfig::default());
        let target = OxideComposition::from_pairs([("SiO2", 3.0), ("CaO", 1.0)]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let result = find_solutions(
            &[],
            &target,
            &SearchOptions::default(),
            &solver,
            &SearchConfig::default(),
            &mut rng,
        );
        assert!(matches!(result, Err(RecipeError::NoMaterialsAvailable)));
    }

    #[test]
    fn test_same_seed_same_result() {
        let table = MolarMassTable::standard();
        let solver = RecipeSolver::new(&table, SolverConfig::default());
        let mats = vec![
            material("Silica", &[("SiO2", 99.5), ("Al2O3", 0.3), ("Loi", 0.2)]),
            material("Whiting", &[("CaO", 55.4), ("MgO", 0.3), ("Loi", 44.3)]),
            material("Kaolin", &[("SiO2", 46.0), ("Al2O3", 38.0), ("Loi", 16.0)]),
            material("Feldspar", &[("SiO2", 68.5), ("Al2O3", 17.0), ("K2O", 10.0), ("Na2O", 3.0), ("Loi", 1.5)]),
            material("Talc", &[("SiO2", 62.0), ("MgO", 30.5), ("Loi", 7.5)]),
        ];
        let target = OxideComposition::from_pairs([
            ("SiO2", 3.0),
            ("Al2O3", 0.35),
            ("CaO", 0.6),
            ("MgO", 0.1),
            ("K2O", 0.2),
            ("Na2O", 0.1),
        ])
        .unwrap();
        let options = SearchOptions {
            max_solutions: 3,
            prefer_min_materials: true,
            error_tolerance: 0.5,
        };
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            find_solutions(&mats, &target, &options, &solver, &SearchConfig::default(), &mut rng)
                .unwrap()
        };
        let first = run(42);
        assert!(!first.is_empty());
        assert!(first.len() <= 3);
        assert_eq!(run(42), first);
        assert!(first.iter().all(Solution::is_viable));
    }
}
