use ab_glyph::FontVec;
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::warn;

use crate::models::Detection;

const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_SCALE: f32 = 12.0;

const SYSTEM_FONTS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Draws detections onto copies of source images
pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    /// Annotator that draws boxes only
    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn with_font_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        let font = FontVec::try_from_vec(data)
            .map_err(|e| anyhow::anyhow!("Invalid font {}: {}", path.display(), e))?;
        Ok(Self { font: Some(font) })
    }

    /// Use the first common system font found; labels are skipped if none is.
    pub fn with_system_font() -> Self {
        let font = SYSTEM_FONTS.iter().find_map(|path| {
            let data = std::fs::read(path).ok()?;
            FontVec::try_from_vec(data).ok()
        });

        if font.is_none() {
            warn!("No label font found, annotations will contain boxes only");
        }
        Self { font }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render `detections` over a copy of `image`
    pub fn render(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.clone();

        for detection in detections {
            let bbox = &detection.bbox;
            let x = bbox.xmin.round() as i32;
            let y = bbox.ymin.round() as i32;
            let width = (bbox.width().round() as u32).max(1);
            let height = (bbox.height().round() as u32).max(1);

            draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(width, height), OUTLINE_COLOR);

            if let Some(ref font) = self.font {
                let text_x = x.clamp(0, canvas.width().saturating_sub(1) as i32);
                let text_y = y.clamp(0, canvas.height().saturating_sub(1) as i32);
                draw_text_mut(
                    &mut canvas,
                    TEXT_COLOR,
                    text_x,
                    text_y,
                    TEXT_SCALE,
                    font,
                    &detection.caption(),
                );
            }
        }

        canvas
    }

    /// Render and save to `output_path`; the format follows its extension.
    pub fn render_to(
        &self,
        image: &RgbImage,
        detections: &[Detection],
        output_path: &Path,
    ) -> Result<RgbImage> {
        let rendered = self.render(image, detections);
        rendered
            .save(output_path)
            .with_context(|| format!("Failed to save annotated image {}", output_path.display()))?;
        Ok(rendered)
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::with_system_font()
    }
}
