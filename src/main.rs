use anyhow::{bail, Context};
use batikgrid::catalog::CatalogFilter;
use batikgrid::store::FileStore;
use batikgrid::{codec, compute_completion, DesignStore, GridConfig, SilhouetteMask};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "batikgrid", version, about = "Inspect and edit batik garment grids")]
struct Cli {
    /// JSON config file (grid size, silhouettes, threshold, store)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the silhouette mask for a grid size
    Mask {
        #[arg(long)]
        width: Option<usize>,
        #[arg(long)]
        height: Option<usize>,
    },
    /// Write a fresh grid document
    New {
        out: PathBuf,
        #[arg(long)]
        width: Option<usize>,
        #[arg(long)]
        height: Option<usize>,
    },
    /// Set one cell of a grid document in place
    Paint {
        file: PathBuf,
        #[arg(long)]
        y: usize,
        #[arg(long)]
        x: usize,
        #[arg(long)]
        pattern: i32,
        #[arg(long)]
        color: i32,
    },
    /// Completion statistics for a grid document
    Stats {
        file: PathBuf,
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// List designs stored in a directory
    Catalog {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long, value_enum, default_value = "all")]
        filter: FilterArg,
        /// Only designs this identity contributed to
        #[arg(long)]
        by: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum FilterArg {
    All,
    Completed,
    InProgress,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GridConfig> {
    match path {
        Some(p) => GridConfig::from_json_file(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(GridConfig::default()),
    }
}

fn read_grid(file: &PathBuf, config: &GridConfig) -> anyhow::Result<batikgrid::Grid> {
    let data = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let grid = codec::decode_with_table(&data, &config.silhouettes)
        .with_context(|| format!("decoding {}", file.display()))?;
    Ok(grid)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Cmd::Mask { width, height } => {
            let w = width.unwrap_or(config.width);
            let h = height.unwrap_or(config.height);
            let mask = SilhouetteMask::generate(w, h, &config.silhouettes)?;
            print!("{}", mask.render_ascii());
            println!(
                "{}x{}: {} designable, {} forbidden",
                w,
                h,
                mask.designable_count(),
                mask.forbidden_positions().len()
            );
        }
        Cmd::New { out, width, height } => {
            let cfg = GridConfig {
                width: width.unwrap_or(config.width),
                height: height.unwrap_or(config.height),
                ..config
            };
            let grid = cfg.new_grid()?;
            fs::write(&out, codec::encode_grid(&grid)?)
                .with_context(|| format!("writing {}", out.display()))?;
            log::info!("wrote {}x{} grid to {}", cfg.width, cfg.height, out.display());
        }
        Cmd::Paint {
            file,
            y,
            x,
            pattern,
            color,
        } => {
            let mut grid = read_grid(&file, &config)?;
            if pattern <= 0 || color <= 0 {
                bail!("pattern and color ids must be positive");
            }
            grid.set_cell(y, x, pattern, color)?;
            fs::write(&file, codec::encode_grid(&grid)?)
                .with_context(|| format!("writing {}", file.display()))?;
            let stats = compute_completion(&grid, &config.policy());
            println!("{}% complete ({}/{})", stats.percentage, stats.filled, stats.total);
        }
        Cmd::Stats { file, json } => {
            let grid = read_grid(&file, &config)?;
            let stats = compute_completion(&grid, &config.policy());
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "{}/{} cells filled, {}% ({})",
                    stats.filled,
                    stats.total,
                    stats.percentage,
                    if stats.is_complete { "complete" } else { "in progress" }
                );
            }
        }
        Cmd::Catalog {
            dir,
            filter,
            by,
            json,
        } => {
            let store = FileStore::open(&dir, config.silhouettes.clone())?;
            let filter = match (by, filter) {
                (Some(who), _) => CatalogFilter::ContributedBy(who),
                (None, FilterArg::All) => CatalogFilter::All,
                (None, FilterArg::Completed) => CatalogFilter::Completed,
                (None, FilterArg::InProgress) => CatalogFilter::InProgress,
            };
            let entries = store.catalog(&config.policy(), &filter)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for e in entries {
                    println!(
                        "{:<24} {:>3}%  {:?}  {}",
                        e.id,
                        e.completion.percentage,
                        e.status,
                        e.name
                    );
                }
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("batikgrid: {:#}", e);
        std::process::exit(1);
    }
}
