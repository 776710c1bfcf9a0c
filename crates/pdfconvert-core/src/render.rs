//! Placeholder JPEG previews
//!
//! No page content is rasterized: the preview is a blank canvas with a few
//! captions drawn in an 8x8 bitmap font.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

use crate::error::ConvertError;

pub const JPEG_QUALITY: u8 = 85;

/// Each font pixel becomes a `GLYPH_SCALE` x `GLYPH_SCALE` block.
const GLYPH_SCALE: u32 = 2;
const GLYPH_SIZE: u32 = 8;

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const DARK_BLUE: Rgb<u8> = Rgb([0, 0, 139]);
pub const DARK_GREEN: Rgb<u8> = Rgb([0, 100, 0]);
pub const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// A line of text anchored at its top-left pixel
#[derive(Debug, Clone)]
pub struct Caption {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub color: Rgb<u8>,
}

impl Caption {
    pub fn new(text: impl Into<String>, x: u32, y: u32, color: Rgb<u8>) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            color,
        }
    }
}

/// Render captions onto a white `width` x `height` canvas and encode it as JPEG.
pub fn render_placeholder(
    width: u32,
    height: u32,
    captions: &[Caption],
) -> Result<Vec<u8>, ConvertError> {
    let mut canvas = RgbImage::from_pixel(width, height, WHITE);
    for caption in captions {
        draw_text(&mut canvas, caption);
    }

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
        .encode_image(&canvas)
        .map_err(|e| ConvertError::Render(e.to_string()))?;
    Ok(buffer)
}

fn draw_text(canvas: &mut RgbImage, caption: &Caption) {
    let advance = GLYPH_SIZE * GLYPH_SCALE;
    for (i, ch) in caption.text.chars().enumerate() {
        // Characters outside the basic set render as '?'
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            continue;
        };
        let origin_x = caption.x + i as u32 * advance;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let x = origin_x + col * GLYPH_SCALE;
                let y = caption.y + row as u32 * GLYPH_SCALE;
                fill_block(canvas, x, y, caption.color);
            }
        }
    }
}

fn fill_block(canvas: &mut RgbImage, x: u32, y: u32, color: Rgb<u8>) {
    for dy in 0..GLYPH_SCALE {
        for dx in 0..GLYPH_SCALE {
            let (px, py) = (x + dx, y + dy);
            if px < canvas.width() && py < canvas.height() {
                canvas.put_pixel(px, py, color);
            }
        }
    }
}

/// Greedy word wrap at `width` columns.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_placeholder_is_decodable_jpeg() {
        let jpeg = render_placeholder(800, 400, &[Caption::new("Hello", 50, 50, BLACK)]).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (800, 400));
    }

    #[test]
    fn test_caption_darkens_pixels() {
        let jpeg = render_placeholder(200, 100, &[Caption::new("MMMM", 10, 10, BLACK)]).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();

        let dark = decoded.pixels().filter(|p| p.0[0] < 100).count();
        assert!(dark > 50, "expected drawn glyphs, found {} dark pixels", dark);
    }

    #[test]
    fn test_text_off_canvas_is_clipped() {
        let result = render_placeholder(20, 20, &[Caption::new("overflowing", 15, 15, GRAY)]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "This is a demo conversion. In production, actual PDF pages would be converted to images.";
        let lines = wrap(text, 60);
        assert_eq!(
            lines,
            vec![
                "This is a demo conversion. In production, actual PDF pages",
                "would be converted to images.",
            ]
        );
        assert!(lines.iter().all(|line| line.len() <= 60));
    }
}
