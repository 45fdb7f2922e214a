use rand::SeedableRng;
use rand::rngs::StdRng;

use glaze_solver::analysis::analyze_recipe;
use glaze_solver::sample::sample_materials;
use glaze_solver::{
    InventorySelector, MatchBy, Material, MolarMassTable, OxideComposition, RecipeEngine, RecipeError,
    SearchConfig, SearchOptions, StaticInventory,
};

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

fn engine_for(materials: Vec<Material>) -> RecipeEngine<Vec<Material>, StaticInventory> {
    let inventory = StaticInventory::new(materials.iter().map(|m| m.name.clone()));
    RecipeEngine::new(materials, inventory, MolarMassTable::standard())
}

#[test]
fn test_end_to_end_search_finds_generating_materials() {
    let engine = engine_for(sample_materials().unwrap());
    let target = glaze_target();
    let options = SearchOptions {
        max_solutions: 3,
        prefer_min_materials: true,
        error_tolerance: 0.1,
    };

    for seed in [1, 7, 2024] {
        let mut rng = StdRng::seed_from_u64(seed);
        let solutions = engine.search(&target, &options, None, &mut rng).unwrap();
        assert!(!solutions.is_empty());
        assert!(solutions.len() <= 3);

        let best = &solutions[0];
        for (oxide, wanted) in target.iter() {
            let got = best.actual_composition.get(oxide);
            assert!(
                (got - wanted).abs() / wanted <= 0.01,
                "seed {seed}, {oxide}: target {wanted}, actual {got}"
            );
        }
        let hits = [
            "Nepheline Syenite",
            "Silica 325 Mesh",
            "Wollastonite",
            "Ulexite",
            "Kaolin",
        ]
        .iter()
        .filter(|n| best.recipe.contains(n))
        .count();
        assert!(hits >= 3, "seed {seed}: {:?}", best.recipe);
    }
}

#[test]
fn test_search_without_preference_orders_by_error() {
    let engine = engine_for(sample_materials().unwrap());
    let mut rng = StdRng::seed_from_u64(3);
    let solutions = engine
        .search(&glaze_target(), &SearchOptions::default(), None, &mut rng)
        .unwrap();

    assert!(!solutions.is_empty());
    for pair in solutions.windows(2) {
        assert!(pair[0].error_value() <= pair[1].error_value());
    }
    let keys: Vec<_> = solutions.iter().map(|s| s.recipe.dedup_key()).collect();
    for (i, key) in keys.iter().enumerate() {
        assert!(!keys[i + 1..].contains(key), "duplicate recipe in results");
    }
}

#[test]
fn test_prefers_fewer_materials() {
    let all = sample_materials().unwrap();
    let names = [
        "Custer Feldspar",
        "Silica 325 Mesh",
        "Whiting",
        "Kaolin",
        "Talc",
        "Wollastonite",
    ];
    let materials: Vec<Material> = names
        .iter()
        .map(|n| all.iter().find(|m| m.name == *n).unwrap().clone())
        .collect();
    let ingredients = vec![
        ("Custer Feldspar".to_string(), 40.0),
        ("Silica 325 Mesh".to_string(), 30.0),
        ("Whiting".to_string(), 30.0),
    ];
    let target = analyze_recipe(&materials, &ingredients, &MolarMassTable::standard())
        .unwrap()
        .umf;

    let config = SearchConfig {
        attempts_cap: 500,
        attempts_per_material: 50,
        ..SearchConfig::default()
    };
    let engine = engine_for(materials).with_search_config(config);
    let options = SearchOptions {
        max_solutions: 3,
        prefer_min_materials: true,
        error_tolerance: 0.05,
    };
    let mut rng = StdRng::seed_from_u64(11);
    let solutions = engine.search(&target, &options, None, &mut rng).unwrap();

    let best = &solutions[0];
    assert_eq!(best.materials_count, 3);
    assert!(best.recipe.contains("Custer Feldspar"));
    assert!(best.recipe.contains("Silica 325 Mesh"));
    assert!(best.recipe.contains("Whiting"));
    assert_eq!(best.error_value(), 0.0);
}

#[test]
fn test_same_seed_reproduces_search() {
    let engine = engine_for(sample_materials().unwrap());
    let options = SearchOptions {
        max_solutions: 4,
        prefer_min_materials: true,
        error_tolerance: 0.2,
    };
    let run = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);
        engine
            .search(&glaze_target(), &options, None, &mut rng)
            .unwrap()
    };
    assert_eq!(run(99), run(99));
}

#[test]
fn test_empty_inventory_is_reported() {
    let materials = sample_materials().unwrap();
    let engine = RecipeEngine::new(
        materials,
        StaticInventory::new(Vec::<String>::new()),
        MolarMassTable::standard(),
    );
    let mut rng = StdRng::seed_from_u64(0);

    let result = engine.search(&glaze_target(), &SearchOptions::default(), None, &mut rng);
    assert!(matches!(result, Err(RecipeError::NoMaterialsAvailable)));

    let selector = InventorySelector::new(["Not A Material"]);
    let result = engine.solve_single(&glaze_target(), Some(&selector));
    assert!(matches!(result, Err(RecipeError::NoMaterialsAvailable)));
}

#[test]
fn test_selector_limits_materials() {
    let engine = engine_for(sample_materials().unwrap());
    let selector = InventorySelector::new(["Whiting", "Silica 325 Mesh", "Kaolin"]);
    let target = OxideComposition::from_pairs([("SiO2", 2.5), ("Al2O3", 0.25), ("CaO", 1.0)]).unwrap();

    let s = engine.solve_single(&target, Some(&selector)).unwrap();
    assert!(s.is_viable());
    assert!(s.recipe.iter().all(|(name, _)| selector.contains(name)));
    assert_eq!(engine.available_materials(Some(&selector)).unwrap().len(), 3);
}

#[test]
fn test_unreachable_target_yields_no_solutions() {
    let engine = engine_for(sample_materials().unwrap());
    let selector = InventorySelector::new(["Silica 325 Mesh"]);
    let target = OxideComposition::from_pairs([("ZnO", 1.0)]).unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    let found = engine
        .search(&target, &SearchOptions::default(), Some(&selector), &mut rng)
        .unwrap();
    assert!(found.is_empty());

    let single = engine.solve_single(&target, Some(&selector)).unwrap();
    assert!(!single.is_viable());
}

#[test]
fn test_empty_target_is_rejected() {
    let engine = engine_for(sample_materials().unwrap());
    let target = OxideComposition::from_pairs([("SiO2", 0.0)]).unwrap();
    assert!(matches!(
        engine.solve_single(&target, None),
        Err(RecipeError::InvalidComposition(_))
    ));
}

#[test]
fn test_inventory_of_material_ids() {
    let materials = sample_materials().unwrap();
    let inventory = StaticInventory::from_flags(&materials, MatchBy::Id);
    let engine = RecipeEngine::new(materials, inventory, MolarMassTable::standard());
    assert_eq!(engine.available_materials(None).unwrap().len(), 13);

    let selector = InventorySelector::new(["whiting", "silica-325-mesh", "kaolin"]);
    let target = OxideComposition::from_pairs([("SiO2", 2.5), ("Al2O3", 0.25), ("CaO", 1.0)]).unwrap();
    let s = engine.solve_single(&target, Some(&selector)).unwrap();
    assert!(s.is_viable());
    assert_eq!(engine.available_materials(Some(&selector)).unwrap().len(), 3);
}

#[test]
fn test_invalid_error_tolerance_is_rejected() {
    let engine = engine_for(sample_materials().unwrap());
    let mut rng = StdRng::seed_from_u64(3);
    for tolerance in [f64::NAN, f64::INFINITY, -0.5] {
        let options = SearchOptions {
            error_tolerance: tolerance,
            ..SearchOptions::default()
        };
        let result = engine.search(&glaze_target(), &options, None, &mut rng);
        assert!(matches!(result, Err(RecipeError::InvalidSearchOptions(_))));
    }
}
