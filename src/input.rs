//! Parsing of command-line composition and recipe arguments

use regex::Regex;

use crate::error::{RecipeError, Result};
use crate::models::OxideComposition;

const PAIR_PATTERN: &str =
    r"^\s*([A-Za-z][A-Za-z0-9]*)\s*[=:]\s*([+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s*$";

/// Parse a composition given either as a JSON object
/// (`{"SiO2": 3.0, "Al2O3": 0.3}`) or as comma-separated pairs
/// (`SiO2=3.0, Al2O3=0.3`).
pub fn parse_composition(text: &str) -> Result<OxideComposition> {
    let text = text.trim();
    if text.starts_with('{') {
        return Ok(serde_json::from_str(text)?);
    }

    let pair_re =
        Regex::new(PAIR_PATTERN).map_err(|e| RecipeError::InvalidComposition(e.to_string()))?;
    let mut pairs = Vec::new();
    for part in text.split(',').filter(|p| !p.trim().is_empty()) {
        let cap = pair_re.captures(part).ok_or_else(|| {
            RecipeError::InvalidComposition(format!("expected Oxide=value, got '{}'", part.trim()))
        })?;
        let value: f64 = cap[2]
            .parse()
            .map_err(|_| RecipeError::InvalidComposition(format!("bad number '{}'", &cap[2])))?;
        pairs.push((cap[1].to_string(), value));
    }

    if pairs.is_empty() {
        return Err(RecipeError::InvalidComposition(
            "no oxides given".to_string(),
        ));
    }
    OxideComposition::from_pairs(pairs)
}

/// Parse one `Material Name=amount` recipe ingredient.
pub fn parse_ingredient(arg: &str) -> Result<(String, f64)> {
    let (name, amount) = arg.rsplit_once('=').ok_or_else(|| {
        RecipeError::InvalidComposition(format!("expected Name=amount, got '{arg}'"))
    })?;
    let name = name.trim();
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| RecipeError::InvalidComposition(format!("bad amount in '{arg}'")))?;
    if name.is_empty() || !amount.is_finite() || amount < 0.0 {
        return Err(RecipeError::InvalidComposition(format!(
            "invalid ingredient '{arg}'"
        )));
    }
    Ok((name.to_string(), amount))
}

/// Split a comma-separated list of material names.
pub fn parse_name_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
