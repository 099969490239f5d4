use crate::bitmap_font;
use crate::error::{BrandError, Result};
use crate::models::{FontSource, Rgb};
use image::{imageops, Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Label height as a fraction of the icon's shorter side.
const FONT_SIZE_RATIO: f32 = 0.45;
const TEXT_SHADOW_ALPHA: u8 = 80;

/// A font resolved once per run and reused for every size.
pub struct Typeface {
    kind: TypefaceKind,
}

enum TypefaceKind {
    Outline {
        options: usvg::Options<'static>,
        family: String,
    },
    Bitmap,
}

impl Typeface {
    pub fn builtin() -> Self {
        Self {
            kind: TypefaceKind::Bitmap,
        }
    }

    /// Resolves a font source, falling back to the built-in bitmap font when
    /// nothing usable is found. Never fails.
    pub fn resolve(source: &FontSource) -> Self {
        match source {
            FontSource::Builtin => Self::builtin(),
            FontSource::System { families } => {
                let mut db = fontdb::Database::new();
                db.load_system_fonts();
                debug!("Loaded {} system font faces", db.len());
                match first_installed(&db, families) {
                    Some(family) => Self::outline(db, family),
                    None => {
                        warn!("None of the fonts {:?} are installed, using the built-in font", families);
                        Self::builtin()
                    }
                }
            }
            FontSource::File { path } => match load_font_file(path) {
                Ok((db, family)) => Self::outline(db, family),
                Err(e) => {
                    warn!("Cannot use font file {}: {}, using the built-in font", path.display(), e);
                    Self::builtin()
                }
            },
        }
    }

    fn outline(db: fontdb::Database, family: String) -> Self {
        debug!("Rendering labels with font family '{}'", family);
        let mut options = usvg::Options::default();
        options.font_family = family.clone();
        options.fontdb = Arc::new(db);
        Self {
            kind: TypefaceKind::Outline { options, family },
        }
    }

    /// The outline font family in use, or `None` for the built-in font.
    pub fn family(&self) -> Option<&str> {
        match &self.kind {
            TypefaceKind::Outline { family, .. } => Some(family),
            TypefaceKind::Bitmap => None,
        }
    }
}

fn first_installed(db: &fontdb::Database, families: &[String]) -> Option<String> {
    families
        .iter()
        .find(|wanted| {
            db.faces()
                .any(|face| face.families.iter().any(|(name, _)| name.eq_ignore_ascii_case(wanted)))
        })
        .cloned()
}

fn load_font_file(path: &Path) -> std::io::Result<(fontdb::Database, String)> {
    let mut db = fontdb::Database::new();
    db.load_font_file(path)?;
    let family = db
        .faces()
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, "no usable font face"))?;
    Ok((db, family))
}

pub fn font_size(width: u32, height: u32) -> u32 {
    (width.min(height) as f32 * FONT_SIZE_RATIO) as u32
}

pub fn shadow_offset(width: u32) -> u32 {
    ((width as f32 * 0.02) as u32).max(2)
}

/// Draws `label` centered on `image`, optionally preceded by a translucent
/// black copy shifted down and to the right.
pub fn draw_label(
    image: &mut RgbaImage,
    label: &str,
    typeface: &Typeface,
    color: Rgb,
    text_shadow: bool,
) -> Result<()> {
    if label.is_empty() {
        return Ok(());
    }
    let (width, height) = image.dimensions();
    let size = font_size(width, height);
    let shadow = text_shadow.then(|| shadow_offset(width));

    let layer = match &typeface.kind {
        TypefaceKind::Outline { options, family } => {
            match outline_layer(width, height, label, family, options, size, color, shadow)? {
                Some(layer) => layer,
                None => {
                    warn!("Font '{}' has no glyphs for '{}', using the built-in font", family, label);
                    bitmap_layer(width, height, label, size, color, shadow)
                }
            }
        }
        TypefaceKind::Bitmap => bitmap_layer(width, height, label, size, color, shadow),
    };

    imageops::overlay(image, &layer, 0, 0);
    Ok(())
}

fn bitmap_layer(
    width: u32,
    height: u32,
    label: &str,
    size: u32,
    color: Rgb,
    shadow: Option<u32>,
) -> RgbaImage {
    let scale = bitmap_font::scale_for(size);
    let (text_width, text_height) = bitmap_font::measure(label, scale);
    let x = (width as i64 - text_width as i64) / 2;
    let y = (height as i64 - text_height as i64) / 2;

    let mut layer = RgbaImage::new(width, height);
    if let Some(offset) = shadow {
        let offset = offset as i64;
        let shade = Rgba([0, 0, 0, TEXT_SHADOW_ALPHA]);
        bitmap_font::draw(&mut layer, label, x + offset, y + offset, scale, shade);
    }
    let [r, g, b] = color.channels();
    bitmap_font::draw(&mut layer, label, x, y, scale, Rgba([r, g, b, 255]));
    layer
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn text_svg(width: u32, height: u32, label: &str, family: &str, size: u32, fill: Rgb, opacity: f32) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}"><text x="0" y="{size}" font-family="{family}" font-size="{size}" font-weight="bold" fill="{fill}" fill-opacity="{opacity}">{label}</text></svg>"#,
        family = escape_xml(family),
        label = escape_xml(label),
    )
}

/// Bounds of the glyph outlines the text was converted to, as opposed to the
/// text node's layout box, which spans the pen origin and the full line height.
fn ink_bounds(tree: &usvg::Tree) -> Option<usvg::Rect> {
    tree.root()
        .children()
        .iter()
        .find_map(|node| match node {
            usvg::Node::Text(text) => Some(text.flattened().abs_bounding_box()),
            _ => None,
        })
        .filter(|bounds| bounds.width() > 0.0 && bounds.height() > 0.0)
}

/// Renders the label with an outline font. Returns `None` when the font
/// produced no ink, so the caller can fall back.
#[allow(clippy::too_many_arguments)]
fn outline_layer(
    width: u32,
    height: u32,
    label: &str,
    family: &str,
    options: &usvg::Options<'static>,
    size: u32,
    color: Rgb,
    shadow: Option<u32>,
) -> Result<Option<RgbaImage>> {
    let text = usvg::Tree::from_str(&text_svg(width, height, label, family, size, color, 1.0), options)?;
    let Some(bounds) = ink_bounds(&text) else {
        return Ok(None);
    };

    let x = (width as f32 - bounds.width()) / 2.0 - bounds.left();
    let y = (height as f32 - bounds.height()) / 2.0 - bounds.top();

    let mut pixmap = Pixmap::new(width, height).ok_or(BrandError::InvalidGeometry { width, height })?;
    if let Some(offset) = shadow {
        let opacity = TEXT_SHADOW_ALPHA as f32 / 255.0;
        let shade = usvg::Tree::from_str(
            &text_svg(width, height, label, family, size, Rgb(0, 0, 0), opacity),
            options,
        )?;
        let offset = offset as f32;
        resvg::render(&shade, Transform::from_translate(x + offset, y + offset), &mut pixmap.as_mut());
    }
    resvg::render(&text, Transform::from_translate(x, y), &mut pixmap.as_mut());

    Ok(Some(pixmap_to_image(&pixmap)))
}

/// Converts tiny-skia's premultiplied pixels into a straight-alpha image.
fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, source) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = source.demultiply();
        *pixel = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::diagonal_gradient;

    const WHITE: Rgb = Rgb(255, 255, 255);

    fn backdrop(size: u32) -> RgbaImage {
        diagonal_gradient(size, size, Rgb(0x25, 0x63, 0xeb), Rgb(0x1e, 0x40, 0xaf)).unwrap()
    }

    /// Inclusive bounds of the pure white pixels.
    fn white_bounds(image: &RgbaImage) -> (u32, u32, u32, u32) {
        let white: Vec<(u32, u32)> = image
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 == [255, 255, 255, 255])
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!white.is_empty(), "no label pixels drawn");
        let left = white.iter().map(|&(x, _)| x).min().unwrap();
        let right = white.iter().map(|&(x, _)| x).max().unwrap();
        let top = white.iter().map(|&(_, y)| y).min().unwrap();
        let bottom = white.iter().map(|&(_, y)| y).max().unwrap();
        (left, top, right, bottom)
    }

    #[test]
    fn sizes_scale_with_the_icon() {
        assert_eq!(font_size(16, 16), 7);
        assert_eq!(font_size(512, 512), 230);
        assert_eq!(font_size(200, 100), 45);
        assert_eq!(shadow_offset(48), 2);
        assert_eq!(shadow_offset(512), 10);
    }

    #[test]
    fn builtin_label_is_centered() {
        for size in [16, 48, 192] {
            let mut image = backdrop(size);
            draw_label(&mut image, "FT", &Typeface::builtin(), WHITE, false).unwrap();

            let (left, top, right, bottom) = white_bounds(&image);
            let (right_margin, bottom_margin) = (size - 1 - right, size - 1 - bottom);
            assert!(left.abs_diff(right_margin) <= 1, "size {size}: {left} vs {right_margin}");
            assert!(top.abs_diff(bottom_margin) <= 1, "size {size}: {top} vs {bottom_margin}");
        }
    }

    #[test]
    fn text_shadow_darkens_pixels_next_to_the_label() {
        let mut plain = backdrop(48);
        draw_label(&mut plain, "FT", &Typeface::builtin(), WHITE, false).unwrap();
        let mut shaded = backdrop(48);
        draw_label(&mut shaded, "FT", &Typeface::builtin(), WHITE, true).unwrap();

        assert_ne!(plain, shaded);
        assert_eq!(white_bounds(&plain), white_bounds(&shaded));
        let darker = plain
            .pixels()
            .zip(shaded.pixels())
            .filter(|(a, b)| b.0[2] < a.0[2])
            .count();
        assert!(darker > 0);
    }

    #[test]
    fn builtin_source_resolves_without_a_family() {
        assert_eq!(Typeface::resolve(&FontSource::Builtin).family(), None);
    }

    #[test]
    fn missing_font_file_falls_back_to_builtin() {
        let source = FontSource::File {
            path: "/nonexistent/font.ttf".into(),
        };
        assert_eq!(Typeface::resolve(&source).family(), None);
    }

    #[test]
    fn unknown_system_families_fall_back_to_builtin() {
        let source = FontSource::System {
            families: vec!["No Such Font Family 1f3a".to_string()],
        };
        assert_eq!(Typeface::resolve(&source).family(), None);
    }

    /// Inclusive bounds of the pixels at least half covered.
    fn ink_box(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        let inked: Vec<(u32, u32)> = image
            .enumerate_pixels()
            .filter(|(_, _, p)| p[3] >= 128)
            .map(|(x, y, _)| (x, y))
            .collect();
        let left = inked.iter().map(|&(x, _)| x).min()?;
        let right = inked.iter().map(|&(x, _)| x).max()?;
        let top = inked.iter().map(|&(_, y)| y).min()?;
        let bottom = inked.iter().map(|&(_, y)| y).max()?;
        Some((left, top, right, bottom))
    }

    fn any_installed_typeface() -> Option<Typeface> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let names: Vec<String> = db
            .faces()
            .filter_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .collect();
        let family = names
            .iter()
            .find(|name| name.contains("Sans"))
            .or_else(|| names.first())?
            .clone();
        Some(Typeface::outline(db, family))
    }

    #[test]
    fn outline_label_ink_is_centered() {
        let Some(typeface) = any_installed_typeface() else {
            return;
        };
        for size in [48, 192, 512] {
            let mut image = RgbaImage::new(size, size);
            draw_label(&mut image, "FT", &typeface, WHITE, false).unwrap();

            let (left, top, right, bottom) = ink_box(&image).expect("label drew no ink");
            let (right_margin, bottom_margin) = (size - 1 - right, size - 1 - bottom);
            assert!(left.abs_diff(right_margin) <= 1, "size {size}: {left} vs {right_margin}");
            assert!(top.abs_diff(bottom_margin) <= 1, "size {size}: {top} vs {bottom_margin}");
        }
    }

    #[test]
    fn outline_text_shadow_is_translucent_black() {
        let Some(typeface) = any_installed_typeface() else {
            return;
        };
        let mut image = RgbaImage::new(192, 192);
        draw_label(&mut image, "FT", &typeface, WHITE, true).unwrap();

        let shade = image
            .pixels()
            .filter(|p| p[3] > 0 && p.0[..3] == [0, 0, 0])
            .map(|p| p[3])
            .max()
            .expect("no shadow pixels drawn");
        assert!(shade.abs_diff(TEXT_SHADOW_ALPHA) <= 1, "shadow alpha {shade}");
        assert!(image.pixels().any(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn empty_label_leaves_the_image_untouched() {
        let original = backdrop(48);
        let mut image = original.clone();
        draw_label(&mut image, "", &Typeface::builtin(), WHITE, true).unwrap();
        assert_eq!(image, original);
    }

    #[test]
    fn escapes_markup_in_labels() {
        assert_eq!(escape_xml(r#"A&<"'>"#), "A&amp;&lt;&quot;&apos;&gt;");
    }
}
