use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tilescape_assets::AssetManifest;
use tilescape_input::TexturePack;
use tilescape_map::{MapParser, ParsedMap};
use tilescape_render::{DebugTextRenderer, RenderView, Renderer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tilescape-cli", about = "CLI tool for tilescape maps")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Parse a map and print what the renderer would draw
    Inspect {
        /// Map file
        map: PathBuf,
        /// Asset manifest providing extra symbol rules
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Texture pack to report materials for
        #[arg(long, default_value = "1")]
        texture_pack: TexturePack,
        /// List every placement
        #[arg(long)]
        placements: bool,
    },
    /// Check a map for characters no symbol rule covers
    Validate {
        /// Map file
        map: PathBuf,
        /// Asset manifest providing extra symbol rules
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Fail when any character is ignored
        #[arg(long)]
        strict: bool,
    },
    /// Print the default asset manifest as JSON
    Manifest {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_map(map: &Path, manifest: Option<&Path>) -> anyhow::Result<ParsedMap> {
    let manifest = match manifest {
        Some(path) => AssetManifest::load(path)
            .with_context(|| format!("reading manifest {}", path.display()))?,
        None => AssetManifest::default(),
    };
    Ok(MapParser::new(manifest.symbol_table()).load(map)?)
}

fn validation_report(parsed: &ParsedMap) -> String {
    let report = &parsed.report;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "rows={} widest={} recognized={}",
        report.rows, report.widest_row, report.recognized
    );
    let _ = writeln!(out, "{}", parsed.scene.counts());
    if report.ignored.is_empty() {
        let _ = writeln!(out, "no ignored characters");
    } else {
        let _ = writeln!(out, "{} ignored character(s):", report.ignored.len());
        for cell in &report.ignored {
            let _ = writeln!(
                out,
                "  {:?} at row {}, column {}",
                cell.symbol,
                cell.row + 1,
                cell.column + 1
            );
        }
    }
    out
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tilescape-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", tilescape_common::crate_info());
            println!("map: {}", tilescape_map::crate_info());
            println!("input: {}", tilescape_input::crate_info());
            println!("assets: {}", tilescape_assets::crate_info());
            println!("render: {}", tilescape_render::crate_info());
        }
        Commands::Inspect {
            map,
            manifest,
            texture_pack,
            placements,
        } => {
            let parsed = parse_map(&map, manifest.as_deref())?;
            let renderer = DebugTextRenderer {
                list_placements: placements,
            };
            let view = RenderView {
                texture_pack,
                ..RenderView::default()
            };
            print!("{}", renderer.render(&parsed.scene, &view));
        }
        Commands::Validate {
            map,
            manifest,
            strict,
        } => {
            let parsed = parse_map(&map, manifest.as_deref())?;
            print!("{}", validation_report(&parsed));
            if parsed.scene.is_empty() {
                tracing::warn!("map {} places nothing", map.display());
            }
            if strict && !parsed.report.ignored.is_empty() {
                bail!(
                    "{} has {} ignored character(s)",
                    map.display(),
                    parsed.report.ignored.len()
                );
            }
        }
        Commands::Manifest { output } => {
            let manifest = AssetManifest::default();
            match output {
                Some(path) => {
                    manifest.save(&path)?;
                    tracing::info!("wrote default manifest to {}", path.display());
                }
                None => println!("{}", manifest.to_json_pretty()?),
            }
        }
    }

    Ok(())
}
