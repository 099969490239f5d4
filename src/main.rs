mod bitmap_font;
mod canvas;
mod error;
mod generate;
mod label;
mod models;
mod utils;

use clap::Parser;
use label::Typeface;
use models::{BrandConfig, FontSource};
use std::path::PathBuf;
use tracing::info;

/// Generates the favicon and touch-icon set for the brand mark.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// JSON file overriding the built-in colors, label, and sizes
    #[arg(short, long, env = "BRANDMARK_CONFIG")]
    config: Option<PathBuf>,

    /// Directory the icons are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Render the label with this TrueType/OpenType file
    #[arg(long, conflicts_with = "builtin_font")]
    font_file: Option<PathBuf>,

    /// Render the label with the built-in bitmap font
    #[arg(long)]
    builtin_font: bool,

    /// Log debug details
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logger(verbose: bool) {
    use tracing_subscriber::{
        filter::LevelFilter, fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, Registry,
    };

    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    Registry::default()
        .with(level)
        .with(layer().with_ansi(true).with_target(false).without_time())
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logger(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => utils::load_config(path)?,
        None => BrandConfig::default(),
    };
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(path) = cli.font_file {
        config.font = FontSource::File { path };
    } else if cli.builtin_font {
        config.font = FontSource::Builtin;
    }

    let typeface = Typeface::resolve(&config.font);
    match typeface.family() {
        Some(family) => info!("Using font family '{}'", family),
        None => info!("Using the built-in bitmap font"),
    }
    generate::generate(&config, &typeface)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_overrides() {
        let cli = Cli::try_parse_from(["brandmark", "-o", "out", "--builtin-font", "-v"]).unwrap();
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert!(cli.builtin_font);
        assert!(cli.verbose);
        assert!(cli.font_file.is_none());
    }

    #[test]
    fn font_flags_conflict() {
        let parsed = Cli::try_parse_from(["brandmark", "--font-file", "a.ttf", "--builtin-font"]);
        assert!(parsed.is_err());
    }
}
