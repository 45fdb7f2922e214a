//! Built-in sample catalog
//!
//! Typical analyses of common glaze materials, weight percent including
//! loss on ignition. Enough to try the solver without importing anything.

use crate::error::Result;
use crate::models::{Material, MaterialSet, OxideComposition};

const SAMPLE_MATERIALS: &[(&str, &[(&str, f64)])] = &[
    (
        "Nepheline Syenite",
        &[
            ("SiO2", 59.7895),
            ("Al2O3", 20.4136),
            ("Na2O", 5.8666),
            ("K2O", 7.1769),
            ("CaO", 0.7017),
            ("MgO", 0.2978),
            ("Fe2O3", 0.048),
            ("Loi", 5.7059),
        ],
    ),
    (
        "Silica 325 Mesh",
        &[("SiO2", 98.106), ("Al2O3", 0.1752), ("Fe2O3", 0.0192), ("Loi", 1.6996)],
    ),
    (
        "Wollastonite",
        &[
            ("SiO2", 49.25),
            ("CaO", 46.1112),
            ("MgO", 1.886),
            ("SrO", 0.7443),
            ("Fe2O3", 0.1153),
            ("Al2O3", 0.2628),
            ("Loi", 1.6304),
        ],
    ),
    (
        "Ulexite",
        &[("B2O3", 35.3406), ("Na2O", 5.1555), ("CaO", 14.0339), ("Loi", 45.47)],
    ),
    (
        "Kaolin",
        &[
            ("SiO2", 45.8025),
            ("Al2O3", 32.4165),
            ("Fe2O3", 0.3363),
            ("TiO2", 0.459),
            ("K2O", 1.1638),
            ("Na2O", 0.0889),
            ("MgO", 0.5956),
            ("CaO", 0.1002),
            ("Loi", 19.0372),
        ],
    ),
    (
        "Whiting",
        &[("CaO", 55.4), ("MgO", 0.3), ("SiO2", 0.2), ("Loi", 44.1)],
    ),
    (
        "Talc",
        &[
            ("SiO2", 62.0),
            ("MgO", 30.5),
            ("CaO", 0.6),
            ("Al2O3", 0.5),
            ("Fe2O3", 0.2),
            ("Loi", 6.2),
        ],
    ),
    (
        "Custer Feldspar",
        &[
            ("SiO2", 68.5),
            ("Al2O3", 17.0),
            ("K2O", 10.0),
            ("Na2O", 3.0),
            ("CaO", 0.3),
            ("Fe2O3", 0.1),
            ("Loi", 1.1),
        ],
    ),
    ("Dolomite", &[("CaO", 30.4), ("MgO", 21.9), ("Loi", 47.7)]),
    ("Zinc Oxide", &[("ZnO", 100.0)]),
    ("Lithium Carbonate", &[("Li2O", 40.4), ("Loi", 59.6)]),
    ("Alumina Hydrate", &[("Al2O3", 65.1), ("SiO2", 0.1), ("Loi", 34.8)]),
    ("Barium Carbonate", &[("BaO", 77.7), ("Loi", 22.3)]),
];

/// The sample catalog, every material marked as in inventory.
pub fn sample_materials() -> Result<MaterialSet> {
    SAMPLE_MATERIALS
        .iter()
        .map(|&(name, formula)| {
            Ok(Material::new(
                name,
                OxideComposition::from_pairs(formula.iter().copied())?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog_is_well_formed() {
        let materials = sample_materials().unwrap();
        assert_eq!(materials.len(), 13);
        for m in &materials {
            let total = m.formula.total();
            assert!((total - 100.0).abs() < 0.01, "{} sums to {total}", m.name);
            assert!(m.in_inventory);
        }
    }
}
