//! palette-filter CLI.
//!
//! Usage:
//!   palette-filter list --palettes palettes.json
//!   palette-filter apply --palettes palettes.json --palette sepia -o out/ a.png b.png
//!   palette-filter apply --palettes palettes.json -o out/ a.png=sepia b.png=mono

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use palette_filter::{EngineConfig, ImageElement, PaletteEngine, PaletteSet, TransformOutcome};

#[derive(Parser)]
#[command(name = "palette-filter")]
#[command(about = "Remap image colors through named palettes on the GPU")]
struct Cli {
    /// Engine config file (defaults to the per-user config, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply palettes to images and write the results as PNG
    Apply {
        /// JSON file of palettes: {"name": [r, g, b, ...]}
        #[arg(short, long)]
        palettes: PathBuf,

        /// Palette for images given without an explicit `=name`
        #[arg(long)]
        palette: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Images, optionally as `path=palette`
        #[arg(required = true)]
        images: Vec<String>,
    },

    /// List the palettes in a palette file
    List {
        #[arg(short, long)]
        palettes: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load(),
    };

    match cli.command {
        Commands::List { palettes } => {
            let set = PaletteSet::load(&palettes)?;
            for (name, values) in set.iter() {
                let partial = if values.len() % 3 != 0 { " (partial triplet)" } else { "" };
                println!("{}\t{} colors{}", name, values.len() / 3, partial);
            }
        }
        Commands::Apply { palettes, palette, output, images } => {
            let set = PaletteSet::load(&palettes)?;
            let mut engine = PaletteEngine::new(config)?;
            engine.register_palettes(&set)?;
            std::fs::create_dir_all(&output)?;

            for spec in &images {
                let (path, name) = split_image_spec(spec, palette.as_deref());
                let mut element = ImageElement::open(Path::new(path))?;
                if let Some(name) = name {
                    element.set_palette(name);
                }

                match engine.transform(&mut element).await? {
                    TransformOutcome::Applied { src, width, height } => {
                        let dest = output_path(&output, Path::new(path));
                        if let Some(bytes) = engine.blob(&src) {
                            std::fs::write(&dest, &*bytes)?;
                        }
                        engine.revoke_object_url(&src);
                        println!("{} -> {} ({}x{})", path, dest.display(), width, height);
                    }
                    TransformOutcome::Skipped(reason) => {
                        println!("{} skipped: {:?}", path, reason);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Split `path=palette`; fall back to `default` when no name is given.
///
/// A spec naming an existing file is taken as a plain path, so file names
/// containing `=` still work.
fn split_image_spec<'a>(spec: &'a str, default: Option<&'a str>) -> (&'a str, Option<&'a str>) {
    if Path::new(spec).is_file() {
        return (spec, default);
    }
    match spec.rsplit_once('=') {
        Some((path, "")) => (path, default),
        Some((path, name)) => (path, Some(name)),
        None => (spec, default),
    }
}

fn output_path(dir: &Path, input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    dir.join(format!("{}.png", stem))
}
