//! Error types for recipe reconstruction

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, RecipeError>;

/// Errors that can occur while loading data or reconstructing recipes.
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    /// The inventory selection left no usable materials in the catalog
    #[error("no materials available in the inventory")]
    NoMaterialsAvailable,
    /// The oxide matrix cannot reproduce every target oxide independently
    #[error("matrix rank ({rank}) is lower than the number of oxides ({oxides}); an exact fit is impossible")]
    UnderdeterminedSystem { rank: usize, oxides: usize },
    /// The non-negative least-squares step failed
    #[error("solver failure: {0}")]
    SolverFailure(String),
    /// Every fitted coefficient was zero
    #[error("degenerate fit: all material coefficients are zero")]
    DegenerateFit,
    /// A composition value was negative, non-finite, or duplicated
    #[error("invalid composition: {0}")]
    InvalidComposition(String),
    /// Nothing in the composition could be converted with the molar-mass table
    #[error("composition has no convertible oxides")]
    EmptyComposition,
    #[error("invalid search options: {0}")]
    InvalidSearchOptions(String),
    #[error("unknown material: {0}")]
    UnknownMaterial(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
