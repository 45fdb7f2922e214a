//! Text rendering of solutions and analyses

use std::fmt;

use crate::analysis::RecipeAnalysis;
use crate::models::{ErrorScore, OxideComposition, Solution};

/// One solution rendered as a recipe plus a target/actual UMF table.
pub struct SolutionReport<'a> {
    pub solution: &'a Solution,
    /// 1-based position in a ranked list, if any.
    pub rank: Option<usize>,
}

impl<'a> SolutionReport<'a> {
    pub fn new(solution: &'a Solution) -> Self {
        SolutionReport {
            solution,
            rank: None,
        }
    }

    pub fn ranked(solution: &'a Solution, rank: usize) -> Self {
        SolutionReport {
            solution,
            rank: Some(rank),
        }
    }
}

impl fmt::Display for SolutionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.solution;
        match self.rank {
            Some(rank) => writeln!(f, "=== Solution {rank} ===")?,
            None => writeln!(f, "=== Solution ===")?,
        }

        match &s.error {
            ErrorScore::Value(error) => writeln!(f, "Error: {error:.4}")?,
            ErrorScore::Failed(reason) => {
                writeln!(f, "No recipe found: {reason}")?;
                return Ok(());
            }
        }
        writeln!(f)?;

        writeln!(f, "Recipe ({} materials):", s.materials_count)?;
        for (name, percent) in s.recipe.iter() {
            writeln!(f, "  {:<30} {:>7.2}%", name, percent)?;
        }
        writeln!(f, "  {:<30} {:>7.2}%", "Total", s.recipe.total())?;
        writeln!(f)?;

        writeln!(f, "{:<8} {:>10} {:>10} {:>10}", "Oxide", "Target", "Actual", "Diff")?;
        writeln!(f, "{}", "-".repeat(41))?;
        for oxide in union_oxides(&s.target_composition, &s.actual_composition) {
            let target = s.target_composition.get(oxide);
            let actual = s.actual_composition.get(oxide);
            writeln!(
                f,
                "{:<8} {:>10.4} {:>10.4} {:>+10.4}",
                oxide,
                target,
                actual,
                actual - target
            )?;
        }
        Ok(())
    }
}

fn union_oxides<'c>(a: &'c OxideComposition, b: &'c OxideComposition) -> Vec<&'c str> {
    let mut oxides: Vec<&str> = a.oxides().chain(b.oxides()).collect();
    oxides.sort_unstable();
    oxides.dedup();
    oxides
}

/// Render a composition as an aligned two-column table.
pub fn format_composition(composition: &OxideComposition, decimals: usize) -> String {
    let mut output = String::new();
    for (oxide, value) in composition.iter() {
        output.push_str(&format!("  {:<8} {:>10.*}\n", oxide, decimals, value));
    }
    output
}

/// Render a ranked list of solutions, best first.
pub fn format_solutions(solutions: &[Solution]) -> String {
    if solutions.is_empty() {
        return "No solutions found.\n".to_string();
    }
    solutions
        .iter()
        .enumerate()
        .map(|(i, s)| SolutionReport::ranked(s, i + 1).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "inf".to_string(),
    }
}

impl fmt::Display for RecipeAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Recipe Analysis ===")?;
        for m in &self.matches {
            match &m.material {
                Some(material) if *material == m.ingredient => {
                    writeln!(f, "  {:<30} {:>7.2}", m.ingredient, m.amount)?
                }
                Some(material) => {
                    writeln!(f, "  {:<30} {:>7.2}  (as {material})", m.ingredient, m.amount)?
                }
                None => writeln!(f, "  {:<30} {:>7.2}  NOT FOUND", m.ingredient, m.amount)?,
            }
        }
        writeln!(f)?;

        writeln!(f, "UMF:")?;
        write!(f, "{}", format_composition(&self.umf, 3))?;
        writeln!(f)?;

        writeln!(f, "Weight composition (%):")?;
        write!(f, "{}", format_composition(&self.weight_composition, 2))?;
        writeln!(f)?;

        writeln!(f, "Ratios:")?;
        writeln!(f, "  SiO2:Al2O3  {}", format_ratio(self.ratios.silica_alumina))?;
        writeln!(f, "  R2O:RO      {}", format_ratio(self.ratios.r2o_ro))?;
        writeln!(f, "  RO:R2O      {}", format_ratio(self.ratios.ro_r2o))?;
        Ok(())
    }
}
