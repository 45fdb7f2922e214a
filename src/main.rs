//! Glaze Recipe Solver
//!
//! Reconstructs glaze batch recipes from a target Unity Molecular Formula.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use glaze_solver::analysis::analyze_recipe;
use glaze_solver::db::{self, SqliteCatalog, SqliteInventory};
use glaze_solver::input::{parse_composition, parse_ingredient, parse_name_list};
use glaze_solver::report::{SolutionReport, format_composition, format_solutions};
use glaze_solver::{
    InventorySelector, MatchBy, RecipeEngine, SearchOptions, SolverConfig, TruncationPolicy, import,
};

#[derive(Parser)]
#[command(name = "glaze-solver")]
#[command(about = "Glaze recipe reconstruction from Unity Molecular Formula targets")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "glaze.db", global = true)]
    database: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Load the built-in sample catalog and standard molar masses
    LoadSample,

    /// Import material JSON files from a directory
    Import {
        /// Directory to scan for *.json files
        dir: PathBuf,

        /// Remove existing materials before importing
        #[arg(long)]
        clear: bool,
    },

    /// List materials in the catalog
    ListMaterials {
        /// Only show materials in the inventory
        #[arg(long)]
        inventory: bool,
    },

    /// Change which materials are in the inventory
    Inventory {
        #[command(subcommand)]
        action: InventoryAction,
    },

    /// Fit one recipe using every available material
    Solve {
        /// Target UMF, e.g. "SiO2=3.1,Al2O3=0.38,CaO=0.7" or a JSON object
        #[arg(short, long)]
        umf: String,

        /// Comma-separated materials to use instead of the stored inventory
        #[arg(short, long)]
        inventory: Option<String>,

        /// Rescale the recipe to exactly 100% after dropping trace materials
        #[arg(long)]
        renormalize: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Search for several alternative recipes
    Search {
        /// Target UMF, e.g. "SiO2=3.1,Al2O3=0.38,CaO=0.7" or a JSON object
        #[arg(short, long)]
        umf: String,

        /// Number of solutions to return
        #[arg(short, long, default_value = "3")]
        solutions: usize,

        /// Prefer recipes with fewer materials
        #[arg(long)]
        min_materials: bool,

        /// Relative error allowance for small-subset recipes
        #[arg(long, default_value = "0.01")]
        error_tolerance: f64,

        /// Random seed for a reproducible search
        #[arg(long)]
        seed: Option<u64>,

        /// Comma-separated materials to use instead of the stored inventory
        #[arg(short, long)]
        inventory: Option<String>,

        /// Rescale recipes to exactly 100% after dropping trace materials
        #[arg(long)]
        renormalize: bool,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Convert a composition between UMF and weight percent
    Convert {
        direction: Direction,

        /// Composition, e.g. "SiO2=3.0,CaO=1.0" or a JSON object
        values: String,
    },

    /// Analyze a batch recipe: weight composition, UMF and oxide ratios
    Analyze {
        /// Ingredients as "Material Name=amount"
        #[arg(required = true)]
        ingredients: Vec<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum InventoryAction {
    /// Add materials (by name or id) to the inventory
    Add { names: Vec<String> },
    /// Remove materials (by name or id) from the inventory
    Remove { names: Vec<String> },
    /// Empty the inventory
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    ToWeights,
    ToUmf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            let count = db::seed_sample_data(&conn)?;
            println!("Loaded {} sample materials.", count);
        }

        Commands::Import { dir, clear } => {
            if clear {
                println!("Clearing existing materials...");
                db::clear_catalog(&conn)?;
            }
            let stats = import::import_directory(&conn, &dir)?;
            println!("{}", stats);
        }

        Commands::ListMaterials { inventory } => {
            let materials: Vec<_> = db::list_materials(&conn)?
                .into_iter()
                .filter(|m| !inventory || m.in_inventory)
                .collect();
            if materials.is_empty() {
                println!("No materials in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<30} {:<30} {:>9} {:>7}", "Material", "ID", "Inventory", "Oxides");
                println!("{}", "-".repeat(79));
                for m in materials {
                    println!(
                        "{:<30} {:<30} {:>9} {:>7}",
                        m.name,
                        m.id,
                        if m.in_inventory { "yes" } else { "no" },
                        m.formula.len()
                    );
                }
            }
        }

        Commands::Inventory { action } => match action {
            InventoryAction::Add { names } => {
                for name in &names {
                    db::set_inventory(&conn, name, true)?;
                }
                println!("Added {} materials to the inventory.", names.len());
            }
            InventoryAction::Remove { names } => {
                for name in &names {
                    db::set_inventory(&conn, name, false)?;
                }
                println!("Removed {} materials from the inventory.", names.len());
            }
            InventoryAction::Clear => {
                let count = db::clear_inventory(&conn)?;
                println!("Cleared {} materials from the inventory.", count);
            }
        },

        Commands::Solve {
            umf,
            inventory,
            renormalize,
            json,
        } => {
            let target = parse_composition(&umf).context("Invalid --umf")?;
            let selector = inventory.as_deref().map(selector_from_list);
            let engine = open_engine(&conn, renormalize)?;

            let solution = engine.solve_single(&target, selector.as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&solution.rounded())?);
            } else {
                println!("{}", SolutionReport::new(&solution));
            }
        }

        Commands::Search {
            umf,
            solutions,
            min_materials,
            error_tolerance,
            seed,
            inventory,
            renormalize,
            json,
        } => {
            let target = parse_composition(&umf).context("Invalid --umf")?;
            let selector = inventory.as_deref().map(selector_from_list);
            let engine = open_engine(&conn, renormalize)?;
            let options = SearchOptions {
                max_solutions: solutions,
                prefer_min_materials: min_materials,
                error_tolerance,
            };
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let found = engine.search(&target, &options, selector.as_ref(), &mut rng)?;
            if json {
                let rounded: Vec<_> = found.iter().map(|s| s.rounded()).collect();
                println!("{}", serde_json::to_string_pretty(&rounded)?);
            } else {
                println!("{}", format_solutions(&found));
            }
        }

        Commands::Convert { direction, values } => {
            let composition = parse_composition(&values).context("Invalid composition")?;
            let table = db::load_molar_masses(&conn)?;
            match direction {
                Direction::ToWeights => {
                    let weights = table.to_weight_fraction(&composition)?;
                    println!("Weight composition (%):");
                    print!("{}", format_composition(&weights, 2));
                }
                Direction::ToUmf => {
                    let umf = table.to_umf(&composition)?;
                    println!("UMF:");
                    print!("{}", format_composition(&umf, 3));
                }
            }
        }

        Commands::Analyze { ingredients, json } => {
            let ingredients = ingredients
                .iter()
                .map(|arg| parse_ingredient(arg))
                .collect::<glaze_solver::Result<Vec<_>>>()?;
            let materials = db::list_materials(&conn)?;
            if materials.is_empty() {
                bail!("No materials in database. Run 'import' or 'load-sample' first.");
            }
            let table = db::load_molar_masses(&conn)?;

            let analysis = analyze_recipe(&materials, &ingredients, &table)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                println!("{}", analysis);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn selector_from_list(list: &str) -> InventorySelector {
    InventorySelector::new(parse_name_list(list))
}

fn open_engine(
    conn: &Connection,
    renormalize: bool,
) -> Result<RecipeEngine<SqliteCatalog<'_>, SqliteInventory<'_>>> {
    let molar_masses = db::load_molar_masses(conn)?;
    let truncation = if renormalize {
        TruncationPolicy::Renormalize
    } else {
        TruncationPolicy::Preserve
    };
    let config = SolverConfig {
        truncation,
        ..SolverConfig::default()
    };
    Ok(RecipeEngine::new(
        SqliteCatalog::new(conn),
        SqliteInventory::new(conn, MatchBy::Name),
        molar_masses,
    )
    .with_solver_config(config))
}
