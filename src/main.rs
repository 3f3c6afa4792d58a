#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use duopane::app::{configure_egui_fonts, DuopaneApp};
use duopane::config;
use duopane::keymap::Keymap;
use duopane::listing;

#[derive(Parser, Debug)]
#[command(name = "duopane")]
#[command(about = "Dual-pane grid file manager")]
struct Args {
    /// Start directory; both panes open here unless overridden
    #[arg(default_value = ".")]
    path: PathBuf,
    #[arg(long)]
    left: Option<PathBuf>,
    #[arg(long)]
    right: Option<PathBuf>,
    /// JSON theme/general configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Key bindings file; the built-in table applies without it
    #[arg(long)]
    keys: Option<PathBuf>,
    /// Print the arranged listing of `path` and exit
    #[arg(long, default_value_t = false)]
    cli: bool,
    /// List the whole subtree instead of one directory level
    #[arg(long, default_value_t = false)]
    flat: bool,
}

fn run_cli(args: &Args) -> Result<()> {
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("failed to canonicalize root {}", args.path.display()))?;
    let entries = listing::collect_entries(&root, args.flat)?;
    let arranged = listing::arrange_for_display(entries, &root, false, None);
    for item in &arranged {
        println!("{}", item.file_name);
    }
    Ok(())
}

fn run_gui(args: &Args) -> Result<()> {
    let config = config::load(args.config.as_deref())?;
    let keymap = Keymap::load(args.keys.as_deref())?;

    let left = args.left.clone().unwrap_or_else(|| args.path.clone());
    let right = args.right.clone().unwrap_or_else(|| args.path.clone());
    let left = left.canonicalize().unwrap_or(left);
    let right = right.canonicalize().unwrap_or(right);

    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport =
        eframe::egui::ViewportBuilder::default().with_inner_size(eframe::egui::vec2(1200.0, 800.0));

    info!(left = %left.display(), right = %right.display(), "starting duopane");
    eframe::run_native(
        "duopane",
        native_options,
        Box::new(move |cc| {
            configure_egui_fonts(&cc.egui_ctx);
            Ok(Box::new(DuopaneApp::new(config, keymap, left, right)))
        }),
    )
    .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if args.cli {
        run_cli(&args)
    } else {
        run_gui(&args)
    }
}
