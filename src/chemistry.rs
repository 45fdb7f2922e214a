//! Conversion between Unity Molecular Formula and weight-fraction compositions

use std::collections::BTreeMap;

use crate::error::{RecipeError, Result};
use crate::models::OxideComposition;

/// Alkali fluxes (R2O).
pub const R2O: &[&str] = &["Na2O", "K2O", "Li2O"];

/// Alkaline-earth and other divalent fluxes (RO).
pub const RO: &[&str] = &[
    "MgO", "CaO", "SrO", "BaO", "ZnO", "MnO", "FeO", "CoO", "NiO", "CuO",
];

/// Symbol used for loss on ignition in material formulas.
pub const LOI: &str = "Loi";

/// Standard oxide molar masses in g/mol.
const STANDARD_MOLAR_MASSES: &[(&str, f64)] = &[
    ("SiO2", 60.084),
    ("Al2O3", 101.961),
    ("B2O3", 69.620),
    ("Li2O", 29.881),
    ("Na2O", 61.979),
    ("K2O", 94.196),
    ("BeO", 25.012),
    ("MgO", 40.304),
    ("CaO", 56.077),
    ("SrO", 103.620),
    ("BaO", 153.326),
    ("P2O5", 141.944),
    ("TiO2", 79.866),
    ("ZrO", 123.223),
    ("ZrO2", 123.223),
    ("V2O5", 181.880),
    ("Cr2O3", 151.990),
    ("MnO", 70.937),
    ("MnO2", 86.936),
    ("FeO", 71.844),
    ("Fe2O3", 159.688),
    ("CoO", 74.932),
    ("NiO", 74.693),
    ("CuO", 79.545),
    ("Cu2O", 143.091),
    ("CdO", 128.410),
    ("ZnO", 81.380),
    ("PbO", 223.200),
    ("SnO2", 150.709),
    ("HfO2", 210.490),
    ("Nb2O5", 265.810),
    ("Ta2O5", 441.890),
    ("MoO3", 143.940),
    ("WO3", 231.840),
    ("OsO2", 223.220),
    ("IrO2", 224.220),
    ("PtO2", 227.080),
    ("Ag2O", 231.735),
    ("Au2O3", 441.930),
    ("GeO2", 104.640),
    ("As2O3", 197.840),
    ("Sb2O3", 291.520),
    ("Bi2O3", 465.960),
    ("SeO2", 110.960),
    ("La2O3", 325.810),
    ("CeO2", 172.115),
    ("PrO2", 171.908),
    ("Pr2O3", 329.810),
    ("Nd2O3", 336.480),
    ("U3O8", 842.000),
    ("Sm2O3", 348.720),
    ("Eu2O3", 351.930),
    ("Tb2O3", 365.930),
    ("Dy2O3", 372.000),
    ("Ho2O3", 377.860),
    ("Er2O3", 382.520),
    ("Tm2O3", 384.840),
    ("Yb2O3", 394.080),
    ("Lu2O3", 397.930),
    ("Gd2O3", 362.500),
    ("Y2O3", 225.810),
    ("Tl2O3", 456.760),
    ("Ga2O3", 187.440),
    ("F", 18.998),
    (LOI, 0.0),
];

pub fn is_flux(oxide: &str) -> bool {
    R2O.contains(&oxide) || RO.contains(&oxide)
}

/// Oxide -> molar mass lookup driving the UMF conversions.
///
/// Entries with zero molar mass (loss on ignition) are kept in the table
/// but never take part in molar computations.
#[derive(Debug, Clone, PartialEq)]
pub struct MolarMassTable {
    masses: BTreeMap<String, f64>,
}

impl MolarMassTable {
    /// The built-in table of common glaze oxides.
    pub fn standard() -> Self {
        Self::from_entries(
            STANDARD_MOLAR_MASSES
                .iter()
                .map(|&(oxide, mass)| (oxide.to_string(), mass)),
        )
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        MolarMassTable {
            masses: entries.into_iter().collect(),
        }
    }

    pub fn molar_mass(&self, oxide: &str) -> Option<f64> {
        self.masses.get(oxide).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.masses.iter().map(|(oxide, &mass)| (oxide.as_str(), mass))
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    /// Molar mass usable as a divisor, if the oxide has one.
    fn positive_mass(&self, oxide: &str) -> Option<f64> {
        self.molar_mass(oxide).filter(|&m| m > 0.0)
    }

    /// Convert weight fractions to UMF.
    ///
    /// Molar amounts are normalized so the flux oxides sum to one. Without
    /// any flux, the smallest positive molar amount becomes unity.
    pub fn to_umf(&self, weights: &OxideComposition) -> Result<OxideComposition> {
        let moles: Vec<(&str, f64)> = weights
            .iter()
            .filter_map(|(oxide, weight)| {
                self.positive_mass(oxide).map(|mass| (oxide, weight / mass))
            })
            .collect();

        let flux_sum: f64 = moles
            .iter()
            .filter(|(oxide, _)| is_flux(oxide))
            .map(|(_, amount)| amount)
            .sum();

        let unity = if flux_sum > 0.0 {
            flux_sum
        } else {
            moles
                .iter()
                .map(|&(_, amount)| amount)
                .filter(|&amount| amount > 0.0)
                .min_by(f64::total_cmp)
                .ok_or(RecipeError::EmptyComposition)?
        };

        let mut umf = OxideComposition::new();
        for (oxide, amount) in moles {
            umf.accumulate(oxide, amount / unity);
        }
        Ok(umf)
    }

    /// Convert UMF to weight percentages summing to 100.
    pub fn to_weight_fraction(&self, umf: &OxideComposition) -> Result<OxideComposition> {
        let weights: Vec<(&str, f64)> = umf
            .iter()
            .filter_map(|(oxide, amount)| {
                self.positive_mass(oxide).map(|mass| (oxide, amount * mass))
            })
            .collect();

        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return Err(RecipeError::EmptyComposition);
        }

        let mut fractions = OxideComposition::new();
        for (oxide, weight) in weights {
            fractions.accumulate(oxide, weight / total * 100.0);
        }
        Ok(fractions)
    }
}

impl Default for MolarMassTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Euclidean distance between two compositions over the union of their
/// oxides, treating missing entries as zero.
pub fn umf_error(target: &OxideComposition, actual: &OxideComposition) -> f64 {
    let squared: f64 = target
        .oxides()
        .chain(actual.oxides().filter(|oxide| !target.contains(oxide)))
        .map(|oxide| {
            let diff = target.get(oxide) - actual.get(oxide);
            diff * diff
        })
        .sum();
    squared.sqrt()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn comp(pairs: &[(&str, f64)]) -> OxideComposition {
        OxideComposition::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_umf_to_weights_sums_to_100() {
        let table = MolarMassTable::standard();
        let umf = comp(&[("SiO2", 4.0), ("Al2O3", 1.0), ("Na2O", 0.5), ("K2O", 0.5)]);
        let w = table.to_weight_fraction(&umf).unwrap();
        assert_relative_eq!(w.total(), 100.0, epsilon = 1e-9);
        let batch = 4.0 * 60.084 + 101.961 + 0.5 * 61.979 + 0.5 * 94.196;
        assert_relative_eq!(w.get("SiO2"), 4.0 * 60.084 / batch * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_weights_to_umf_normalizes_fluxes() {
        let table = MolarMassTable::standard();
        let w = comp(&[("SiO2", 60.084), ("CaO", 56.077 * 0.5), ("Na2O", 61.979 * 0.5)]);
        let umf = table.to_umf(&w).unwrap();
        assert_relative_eq!(umf.get("CaO") + umf.get("Na2O"), 1.0, epsilon = 1e-12);
        assert_relative_eq!(umf.get("SiO2"), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_no_flux_uses_smallest_amount() {
        let table = MolarMassTable::standard();
        let w = comp(&[("SiO2", 60.084 * 3.0), ("Al2O3", 101.961)]);
        let umf = table.to_umf(&w).unwrap();
        assert_relative_eq!(umf.get("Al2O3"), 1.0, epsilon = 1e-12);
        assert_relative_eq!(umf.get("SiO2"), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_loi_and_unknown_oxides_are_excluded() {
        let table = MolarMassTable::standard();
        let w = comp(&[("SiO2", 50.0), ("CaO", 20.0), ("Loi", 30.0), ("Xx", 5.0)]);
        let umf = table.to_umf(&w).unwrap();
        assert!(!umf.contains("Loi"));
        assert!(!umf.contains("Xx"));

        let back = table.to_weight_fraction(&umf).unwrap();
        assert!(!back.contains("Loi"));
        assert_relative_eq!(back.total(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_composition_is_an_error() {
        let table = MolarMassTable::standard();
        assert!(matches!(
            table.to_umf(&comp(&[("Loi", 10.0)])),
            Err(RecipeError::EmptyComposition)
        ));
        assert!(matches!(
            table.to_weight_fraction(&comp(&[("SiO2", 0.0)])),
            Err(RecipeError::EmptyComposition)
        ));
        assert!(table.to_umf(&OxideComposition::new()).is_err());
    }

    #[test]
    fn test_umf_error_is_symmetric_over_union() {
        let a = comp(&[("SiO2", 3.0), ("Al2O3", 0.3)]);
        let b = comp(&[("SiO2", 2.0), ("CaO", 1.0)]);
        assert_relative_eq!(umf_error(&a, &b), umf_error(&b, &a));
        assert_relative_eq!(umf_error(&a, &b), (1.0f64 + 0.09 + 1.0).sqrt(), epsilon = 1e-12);
        assert_eq!(umf_error(&a, &a), 0.0);
    }
}
