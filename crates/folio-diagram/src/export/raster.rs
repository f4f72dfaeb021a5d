//! SVG → PNG/PDF conversion with pure-Rust rasterization (`usvg` + `resvg` + `tiny-skia`) and
//! vector PDF output (`svg2pdf`).

use super::{ExportError, Result};
use futures::FutureExt;
use futures::future::LocalBoxFuture;

#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub scale: f32,
    /// Solid fill painted before the diagram. `None` keeps the surface transparent.
    pub background: Option<String>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: None,
        }
    }
}

/// Turns serialized markup into PNG bytes.
///
/// This is the asynchronous "load the markup as an image, draw it" step of PNG export. The
/// returned future may never complete for hostile or broken inputs on some hosts; the export
/// pipeline races it against a timeout.
pub trait ImageRasterizer {
    fn rasterize(
        &self,
        svg: String,
        options: RasterOptions,
    ) -> LocalBoxFuture<'static, Result<Vec<u8>>>;
}

/// Rasterizes in-process with `resvg`. The work runs when the future is first polled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResvgRasterizer;

impl ImageRasterizer for ResvgRasterizer {
    fn rasterize(
        &self,
        svg: String,
        options: RasterOptions,
    ) -> LocalBoxFuture<'static, Result<Vec<u8>>> {
        async move { svg_to_png(&svg, &options) }.boxed_local()
    }
}

pub fn svg_to_png(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, options.scale, options.background.as_deref())?;
    pixmap.encode_png().map_err(|_| ExportError::PngEncode)
}

/// Converts SVG to a single-page PDF sized to the diagram. Text stays vector text.
pub fn svg_to_pdf(svg: &str, background: Option<&str>) -> Result<Vec<u8>> {
    let svg = match background {
        Some(bg) => with_background_rect(svg, bg),
        None => svg.to_string(),
    };

    let mut opt = svg2pdf::usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    // Keep output stable-ish across environments while still using system fonts.
    opt.font_family = "Arial".to_string();

    let tree = svg2pdf::usvg::Tree::from_str(&svg, &opt).map_err(|_| ExportError::SvgParse)?;

    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|_| ExportError::PdfConvert)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ParsedViewBox {
    pub(crate) min_x: f32,
    pub(crate) min_y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

pub(crate) fn parse_svg_viewbox(svg: &str) -> Option<ParsedViewBox> {
    // Cheap, non-validating parse for root viewBox: `viewBox="minX minY w h"`.
    let i = svg.find("viewBox=\"")?;
    let rest = &svg[i + "viewBox=\"".len()..];
    let end = rest.find('"')?;
    let raw = &rest[..end];
    let mut it = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty());
    let min_x = it.next()?.parse::<f32>().ok()?;
    let min_y = it.next()?.parse::<f32>().ok()?;
    let width = it.next()?.parse::<f32>().ok()?;
    let height = it.next()?.parse::<f32>().ok()?;
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Some(ParsedViewBox {
            min_x,
            min_y,
            width,
            height,
        })
    } else {
        None
    }
}

/// Inserts a full-size filled rect as the first child of the root `<svg>`, so vector outputs
/// carry the theme background just like raster ones.
pub(crate) fn with_background_rect(svg: &str, color: &str) -> String {
    let Some(start) = svg.find("<svg") else {
        return svg.to_string();
    };
    let Some(tag_end) = root_tag_end(&svg[start..]).map(|i| start + i) else {
        return svg.to_string();
    };
    if svg[..tag_end].ends_with('/') {
        return svg.to_string();
    }

    let rect = match parse_svg_viewbox(svg) {
        Some(vb) => format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{color}"/>"#,
            vb.min_x, vb.min_y, vb.width, vb.height
        ),
        None => format!(r#"<rect width="100%" height="100%" fill="{color}"/>"#),
    };

    let mut out = String::with_capacity(svg.len() + rect.len());
    out.push_str(&svg[..=tag_end]);
    out.push_str(&rect);
    out.push_str(&svg[tag_end + 1..]);
    out
}

/// Byte offset of the `>` closing the tag that starts at offset 0, skipping quoted values.
fn root_tag_end(tag: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, ch) in tag.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone, Copy)]
struct RasterGeometry {
    min_x: f32,
    min_y: f32,
    width: f32,
    height: f32,
}

fn svg_to_pixmap(svg: &str, scale: f32, background: Option<&str>) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = "Arial".to_string();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| ExportError::SvgParse)?;

    let (geo, translate_min_to_origin) = if let Some(vb) = parse_svg_viewbox(svg) {
        // usvg already maps the viewBox min corner to (0,0); translating again would push
        // diagrams with negative mins off the surface.
        (
            RasterGeometry {
                min_x: 0.0,
                min_y: 0.0,
                width: vb.width,
                height: vb.height,
            },
            false,
        )
    } else {
        // No viewBox: size the surface to the drawn content.
        let bbox = tree.root().abs_stroke_bounding_box();
        let w = bbox.width().max(1.0);
        let h = bbox.height().max(1.0);
        if w.is_finite() && h.is_finite() {
            (
                RasterGeometry {
                    min_x: bbox.x(),
                    min_y: bbox.y(),
                    width: w,
                    height: h,
                },
                true,
            )
        } else {
            let size = tree.size();
            (
                RasterGeometry {
                    min_x: 0.0,
                    min_y: 0.0,
                    width: size.width(),
                    height: size.height(),
                },
                false,
            )
        }
    };

    let width_px = (geo.width * scale).ceil().max(1.0) as u32;
    let height_px = (geo.height * scale).ceil().max(1.0) as u32;

    let mut pixmap =
        tiny_skia::Pixmap::new(width_px, height_px).ok_or(ExportError::PixmapAlloc)?;

    if let Some(bg) = background {
        match parse_hex_rgb(bg) {
            Some(color) => pixmap.fill(color),
            None => tracing::warn!(background = bg, "unparseable raster background ignored"),
        }
    }

    let transform = if translate_min_to_origin {
        tiny_skia::Transform::from_row(
            scale,
            0.0,
            0.0,
            scale,
            -geo.min_x * scale,
            -geo.min_y * scale,
        )
    } else {
        tiny_skia::Transform::from_scale(scale, scale)
    };

    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}

/// `#rrggbb`, the form theme backgrounds come in.
fn parse_hex_rgb(text: &str) -> Option<tiny_skia::Color> {
    let hex = text.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(tiny_skia::Color::from_rgba8(
        channel(0)?,
        channel(2)?,
        channel(4)?,
        255,
    ))
}
