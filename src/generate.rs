use crate::canvas::{corner_radius, diagonal_gradient, round_corners, with_drop_shadow};
use crate::error::{BrandError, Result};
use crate::label::{draw_label, Typeface};
use crate::models::{BrandConfig, Effects};
use crate::utils::file_digest;
use ico::{IconDir, IconDirEntry, IconImage, ResourceType};
use image::RgbaImage;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};

/// Largest frame the ICO format can hold.
const ICO_MAX_SIZE: u32 = 256;

/// One file written by a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Everything a generation run wrote, in order.
#[derive(Debug, Default)]
pub struct Report {
    pub files: Vec<GeneratedFile>,
}

/// Renders one icon: gradient, then the requested finishing passes, then the label.
pub fn render_icon(
    width: u32,
    height: u32,
    config: &BrandConfig,
    typeface: &Typeface,
    effects: Effects,
) -> Result<RgbaImage> {
    let mut image = diagonal_gradient(width, height, config.primary_color, config.secondary_color)?;
    if effects.rounded_corners {
        round_corners(&mut image, corner_radius(width));
    }
    if effects.drop_shadow {
        image = with_drop_shadow(&image);
    }
    draw_label(&mut image, &config.label, typeface, config.text_color, effects.text_shadow)?;
    Ok(image)
}

/// Packs square frames into a single multi-resolution ICO file.
pub fn write_ico(path: &Path, frames: &[RgbaImage]) -> Result<()> {
    let mut icon_dir = IconDir::new(ResourceType::Icon);
    for frame in frames {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 || width > ICO_MAX_SIZE || height > ICO_MAX_SIZE {
            return Err(BrandError::InvalidGeometry { width, height });
        }
        let icon_image = IconImage::from_rgba_data(width, height, frame.as_raw().clone());
        icon_dir.add_entry(IconDirEntry::encode(&icon_image)?);
    }
    let file = BufWriter::new(File::create(path)?);
    icon_dir.write(file)?;
    Ok(())
}

fn record(report: &mut Report, file: GeneratedFile) -> Result<()> {
    info!("Created: {} ({}x{})", file.path.display(), file.width, file.height);
    if tracing::enabled!(Level::DEBUG) {
        let digest = file_digest(&file.path)?;
        debug!("sha256 {} {}", digest, file.path.display());
    }
    report.files.push(file);
    Ok(())
}

/// Writes every configured PNG and the multi-resolution ICO into the output directory.
pub fn generate(config: &BrandConfig, typeface: &Typeface) -> Result<Report> {
    fs::create_dir_all(&config.output_dir)?;
    let mut report = Report::default();

    info!("Generating {} icons for '{}'", config.targets.len(), config.label);
    debug!(
        "Palette {} -> {}, accent {}, text {}",
        config.primary_color, config.secondary_color, config.accent_color, config.text_color
    );
    for target in &config.targets {
        let effects = Effects::for_width(target.width);
        debug!("{}: {:?}", target.file_name, effects);

        let image = render_icon(target.width, target.height, config, typeface, effects)?;
        let path = config.output_dir.join(&target.file_name);
        image.save(&path)?;
        record(
            &mut report,
            GeneratedFile {
                path,
                width: target.width,
                height: target.height,
            },
        )?;
    }

    info!("Creating multi-resolution {}", config.ico_file_name);
    let frames = config
        .ico_sizes
        .iter()
        .map(|&size| render_icon(size, size, config, typeface, Effects::none()))
        .collect::<Result<Vec<_>>>()?;
    let ico_path = config.output_dir.join(&config.ico_file_name);
    write_ico(&ico_path, &frames)?;
    let largest = config.ico_sizes.iter().copied().max().unwrap_or(0);
    record(
        &mut report,
        GeneratedFile {
            path: ico_path,
            width: largest,
            height: largest,
        },
    )?;

    info!(
        "All icons generated successfully, {} files saved in {}",
        report.files.len(),
        config.output_dir.display()
    );
    Ok(report)
}
