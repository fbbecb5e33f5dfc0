mod app;
mod config;
mod error;
mod export;
mod geo;
mod render;
mod state;
mod util;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::export::ExportRenderer;
use crate::geo::{DataSources, load_dataset};
use crate::state::Selection;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// TopoJSON world topology.
    #[arg(long, default_value = "data/world-110m.json")]
    topology: PathBuf,

    /// Relationship scores keyed by country code.
    #[arg(long, default_value = "data/relations.json")]
    relations: PathBuf,

    /// Alliance membership lists.
    #[arg(long)]
    alliances: Option<PathBuf>,

    /// Topology object holding the country geometries; defaults to the
    /// first object in the file.
    #[arg(long)]
    object: Option<String>,

    /// TOML file overriding palette, map and export settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Country code selected at startup.
    #[arg(long, conflicts_with = "alliance")]
    select: Option<String>,

    /// Alliance selected at startup.
    #[arg(long)]
    alliance: Option<String>,

    /// Render the selection to SVG and exit.
    #[arg(long)]
    export_svg: Option<PathBuf>,

    /// Render the selection to PNG and exit.
    #[arg(long)]
    export_png: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn sources(&self) -> DataSources {
        DataSources {
            topology: self.topology.clone(),
            relations: self.relations.clone(),
            alliances: self.alliances.clone(),
            object: self.object.clone(),
        }
    }

    fn selection(&self) -> Selection {
        match (&self.select, &self.alliance) {
            (Some(code), _) => Selection::Country(code.trim().to_ascii_uppercase()),
            (None, Some(name)) => Selection::Alliance(name.clone()),
            (None, None) => Selection::None,
        }
    }

    fn is_headless(&self) -> bool {
        self.export_svg.is_some() || self.export_png.is_some()
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "relmap=debug" } else { "relmap=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn export_headless(args: &Args, config: &Config) -> Result<()> {
    let dataset = load_dataset(&args.sources())?;
    let selection = args.selection().validated(&dataset);
    let renderer = ExportRenderer::new(&dataset, &config.palette, &config.export);

    if let Some(path) = &args.export_svg {
        renderer.write_svg(&selection, path)?;
    }
    if let Some(path) = &args.export_png {
        renderer.write_png(&selection, path)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::load_or_default(args.config.as_deref())?;
    if args.is_headless() {
        return export_headless(&args, &config);
    }

    info!(topology = %args.topology.display(), "starting viewer");
    let sources = args.sources();
    let selection = args.selection();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 860.0]),
        ..Default::default()
    };

    eframe::run_native(
        "relmap",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::RelMapApp::new(
                cc, sources, config, selection,
            )))
        }),
    )
    .map_err(|error| anyhow!(error.to_string()))
}
