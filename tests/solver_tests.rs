use approx::assert_relative_eq;
use glaze_solver::analysis::analyze_recipe;
use glaze_solver::matrix::OxideMatrix;
use glaze_solver::sample::sample_materials;
use glaze_solver::{
    ErrorScore, Material, MolarMassTable, OxideComposition, RecipeSolver, SolverConfig,
    TruncationPolicy,
};

const FIVE_MATERIALS: [&str; 5] = [
    "Nepheline Syenite",
    "Silica 325 Mesh",
    "Wollastonite",
    "Ulexite",
    "Kaolin",
];

fn pick(names: &[&str]) -> Vec<Material> {
    let all = sample_materials().unwrap();
    names
        .iter()
        .map(|n| all.iter().find(|m| m.name == *n).unwrap().clone())
        .collect()
}

/// UMF produced by a batch of catalog materials.
fn umf_of(materials: &[Material], batch: &[(&str, f64)]) -> OxideComposition {
    let ingredients: Vec<(String, f64)> = batch.iter().map(|&(n, p)| (n.to_string(), p)).collect();
    analyze_recipe(materials, &ingredients, &MolarMassTable::standard())
        .unwrap()
        .umf
}

fn glaze_target() -> OxideComposition {
    OxideComposition::from_pairs([
        ("SiO2", 3.144),
        ("Al2O3", 0.378),
        ("B2O3", 0.265),
        ("Na2O", 0.143),
        ("K2O", 0.086),
        ("CaO", 0.717),
        ("MgO", 0.048),
        ("SrO", 0.005),
        ("Fe2O3", 0.002),
        ("TiO2", 0.003),
    ])
    .unwrap()
}

fn solve(materials: &[Material], target: &OxideComposition, config: SolverConfig) -> glaze_solver::Solution {
    let table = MolarMassTable::standard();
    let solver = RecipeSolver::new(&table, config);
    let oxides: Vec<&str> = target.oxides().collect();
    let matrix = OxideMatrix::build(materials, &oxides).unwrap();
    solver.solve(&matrix, target, Some(materials))
}

#[test]
fn test_full_catalog_reproduces_glaze() {
    let materials = sample_materials().unwrap();
    let target = glaze_target();
    let s = solve(&materials, &target, SolverConfig::default());

    assert!(s.is_viable());
    for (oxide, wanted) in target.iter() {
        let got = s.actual_composition.get(oxide);
        assert!(
            (got - wanted).abs() / wanted <= 0.01,
            "{oxide}: target {wanted}, actual {got}"
        );
    }
    let hits = FIVE_MATERIALS.iter().filter(|n| s.recipe.contains(n)).count();
    assert!(hits >= 3, "recipe {:?}", s.recipe);
    assert!(s.error_value() < 0.01);
}

#[test]
fn test_three_material_recipe_sums_to_100() {
    let materials = pick(&["Custer Feldspar", "Silica 325 Mesh", "Whiting"]);
    let target = umf_of(
        &materials,
        &[("Custer Feldspar", 40.0), ("Silica 325 Mesh", 30.0), ("Whiting", 30.0)],
    );
    let s = solve(&materials, &target, SolverConfig::default());

    assert_eq!(s.materials_count, 3);
    assert_relative_eq!(s.recipe.total(), 100.0, epsilon = 1e-9);
    assert_relative_eq!(s.recipe.get("Custer Feldspar").unwrap(), 40.0, epsilon = 1e-6);
    assert_relative_eq!(s.recipe.get("Whiting").unwrap(), 30.0, epsilon = 1e-6);
    assert_eq!(s.error, ErrorScore::Value(0.0));
}

#[test]
fn test_recipe_mass_never_exceeds_100() {
    let materials = sample_materials().unwrap();
    let s = solve(&materials, &glaze_target(), SolverConfig::default());
    let total = s.recipe.total();
    assert!(total > 0.0 && total <= 100.0 + 1e-9, "total {total}");
    assert!(s.recipe.iter().all(|(_, pct)| pct > 0.1));
}

fn trace_whiting_case() -> (Vec<Material>, OxideComposition) {
    let materials = pick(&["Custer Feldspar", "Whiting"]);
    let target = umf_of(&materials, &[("Custer Feldspar", 99.95), ("Whiting", 0.05)]);
    (materials, target)
}

#[test]
fn test_truncation_preserve_keeps_dropped_mass_out() {
    let (materials, target) = trace_whiting_case();
    let s = solve(&materials, &target, SolverConfig::default());

    assert_eq!(s.materials_count, 1);
    assert!(!s.recipe.contains("Whiting"));
    assert_relative_eq!(s.recipe.total(), 99.95, epsilon = 1e-6);
    assert!(s.error_value() > 0.0);
}

#[test]
fn test_truncation_renormalize_sums_to_100() {
    let (materials, target) = trace_whiting_case();
    let config = SolverConfig {
        truncation: TruncationPolicy::Renormalize,
        ..SolverConfig::default()
    };
    let s = solve(&materials, &target, config);

    assert_eq!(s.materials_count, 1);
    assert_relative_eq!(s.recipe.get("Custer Feldspar").unwrap(), 100.0, epsilon = 1e-9);
    // Renormalizing rescales the batch, not its chemistry.
    let preserved = solve(&materials, &target, SolverConfig::default());
    assert_eq!(s.error, preserved.error);
}

#[test]
fn test_matrix_fallback_counts_dropped_materials() {
    let (materials, target) = trace_whiting_case();
    let table = MolarMassTable::standard();
    let solver = RecipeSolver::new(&table, SolverConfig::default());
    let oxides: Vec<&str> = target.oxides().collect();
    let matrix = OxideMatrix::build(&materials, &oxides).unwrap();

    let with_catalog = solver.solve(&matrix, &target, Some(&materials));
    let fallback = solver.solve(&matrix, &target, None);

    // Same recipe, but the fallback composition still carries the Whiting
    // that the display threshold removed from the recipe.
    assert_eq!(with_catalog.recipe, fallback.recipe);
    assert!(fallback.error_value() < with_catalog.error_value());
    assert!(fallback.actual_composition.get("CaO") > with_catalog.actual_composition.get("CaO"));
}

#[test]
fn test_unreachable_oxide_gives_degenerate_fit() {
    let materials = pick(&["Silica 325 Mesh"]);
    let target = OxideComposition::from_pairs([("ZnO", 1.0)]).unwrap();
    let s = solve(&materials, &target, SolverConfig::default());

    assert!(!s.is_viable());
    assert!(s.recipe.is_empty());
    match &s.error {
        ErrorScore::Failed(reason) => assert!(reason.contains("degenerate")),
        other => panic!("expected failure, got {other:?}"),
    }
}
