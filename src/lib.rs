//! Glaze recipe reconstruction
//!
//! Given a target glaze chemistry in Unity Molecular Formula (UMF) and a
//! catalog of raw materials, find batch recipes whose fired oxide
//! composition approximates the target.

pub mod analysis;
pub mod chemistry;
pub mod db;
pub mod engine;
pub mod error;
pub mod import;
pub mod input;
pub mod inventory;
pub mod matrix;
pub mod models;
pub mod nnls;
pub mod ranking;
pub mod report;
pub mod sample;
pub mod search;
pub mod solver;

pub use chemistry::MolarMassTable;
pub use engine::RecipeEngine;
pub use error::{RecipeError, Result};
pub use inventory::{InventoryResolver, InventorySelector, MatchBy, MaterialCatalog, StaticInventory};
pub use models::{ErrorScore, Material, MaterialSet, OxideComposition, Recipe, Solution};
pub use search::{SearchConfig, SearchOptions};
pub use solver::{RecipeSolver, SolverConfig, TruncationPolicy};
