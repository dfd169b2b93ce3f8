//! Rigscene
//!
//! Converts an extracted multi-sensor recording into a published lidar
//! scene with cuboid tracks and projected image annotations.

use clap::Parser;
use rigscene_annotate::AttributeMap;
use rigscene_app::{ParserConfig, RecordingParser, init_logging};
use rigscene_ingest::LocalStore;
use std::error::Error;
use std::path::PathBuf;

/// Rigscene - recording to lidar scene converter
#[derive(Parser, Debug)]
#[command(name = "rigscene")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory the recording was extracted to
    data_dir: PathBuf,

    /// Root directory of the item store
    #[arg(short, long)]
    store: PathBuf,

    /// JSON parser config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Attribute dictionary (flat title -> key map or label-schema recipe)
    #[arg(short, long)]
    attributes: Option<PathBuf>,

    /// Enable the IR cameras ("true"/"True")
    #[arg(long)]
    ir: Option<String>,

    /// Enable the RGB cameras ("true"/"True")
    #[arg(long)]
    rgb: Option<String>,

    /// Enable the high resolution RGB cameras ("true"/"True")
    #[arg(long)]
    rgb_highres: Option<String>,

    /// Log level, overridden by RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => ParserConfig::from_path(path)?,
        None => ParserConfig::default(),
    }
    .with_group_flags(
        args.ir.as_deref(),
        args.rgb.as_deref(),
        args.rgb_highres.as_deref(),
    );
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.attributes.is_some() {
        config.attributes = args.attributes;
    }
    init_logging(&config.logging);

    let attributes = match &config.attributes {
        Some(path) => AttributeMap::from_path(path)?,
        None => AttributeMap::new(),
    };
    let mut store = LocalStore::open(&args.store)?;
    let scene = RecordingParser::new(config, attributes).run(&args.data_dir, &mut store)?;
    println!("{} {}", scene.id, scene.filename());
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
