//! Ordering and deduplication of candidate solutions

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::Solution;

/// Material count at which fewer materials stop earning extra error allowance.
const MATERIAL_COUNT_PIVOT: usize = 8;

/// Extra relative error allowed per material below the pivot.
const ALLOWANCE_PER_MATERIAL: f64 = 0.1;

/// Sort key for the minimum-materials ordering.
///
/// Candidates close enough to the best error are ordered by material count
/// first; the rest fall back to pure error order behind them.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PreferenceKey {
    WithinAllowance { count: usize, error: f64 },
    Fallback { error: f64, count: usize },
}

impl PreferenceKey {
    fn new(solution: &Solution, best_error: f64) -> Self {
        let count = solution.materials_count;
        let error = solution.error_value();
        if error <= error_threshold(best_error, count) {
            PreferenceKey::WithinAllowance { count, error }
        } else {
            PreferenceKey::Fallback { error, count }
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        use PreferenceKey::*;
        match (self, other) {
            (WithinAllowance { count: c1, error: e1 }, WithinAllowance { count: c2, error: e2 }) => {
                c1.cmp(c2).then(e1.total_cmp(e2))
            }
            (Fallback { error: e1, count: c1 }, Fallback { error: e2, count: c2 }) => {
                e1.total_cmp(e2).then(c1.cmp(c2))
            }
            (WithinAllowance { .. }, Fallback { .. }) => Ordering::Less,
            (Fallback { .. }, WithinAllowance { .. }) => Ordering::Greater,
        }
    }
}

/// Largest error at which a candidate with `count` materials still counts
/// as competitive with `best_error`.
pub fn error_threshold(best_error: f64, count: usize) -> f64 {
    if count < MATERIAL_COUNT_PIVOT {
        best_error * (1.0 + ALLOWANCE_PER_MATERIAL * (MATERIAL_COUNT_PIVOT - count) as f64)
    } else {
        best_error
    }
}

/// Sort candidates, drop repeats, and keep at most `max_solutions`.
///
/// Non-viable candidates are discarded. The sort is stable, so equal keys
/// keep their input order and the result depends only on the input list.
pub fn rank_solutions(
    candidates: Vec<Solution>,
    max_solutions: usize,
    prefer_min_materials: bool,
) -> Vec<Solution> {
    let mut viable: Vec<Solution> = candidates.into_iter().filter(Solution::is_viable).collect();
    if viable.is_empty() {
        return viable;
    }

    if prefer_min_materials {
        let best_error = viable
            .iter()
            .map(Solution::error_value)
            .fold(f64::INFINITY, f64::min);
        viable.sort_by(|a, b| {
            PreferenceKey::new(a, best_error).cmp(&PreferenceKey::new(b, best_error))
        });
    } else {
        viable.sort_by(|a, b| a.error_value().total_cmp(&b.error_value()));
    }

    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for solution in viable {
        if unique.len() >= max_solutions {
            break;
        }
        if seen.insert(solution.recipe.dedup_key()) {
            unique.push(solution);
        }
    }
    unique
}
