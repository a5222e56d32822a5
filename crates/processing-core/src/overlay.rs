//! Sensor-value text overlay drawn with a built-in 3x5 bitmap font.

use image::{Rgb, RgbImage};

use meltview_session_model::record::MatchedRecord;

/// Image height the overlay layout is designed for.
pub const REFERENCE_HEIGHT: f32 = 480.0;

const LEFT_MARGIN: f32 = 50.0;
const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// The five overlay lines, top to bottom.
pub fn overlay_lines(record: &MatchedRecord) -> [String; 5] {
    [
        format!("X: {:.2}", record.x),
        format!("Y: {:.2}", record.y),
        format!("Z: {:.2}", record.z),
        format!("AREA: {:.2}", record.area),
        format!("MAX TEMP: {:.2}", record.max_temperature),
    ]
}

/// Geometry of the overlay for one image height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayout {
    /// Side of one font pixel, in image pixels.
    pub cell: u32,

    /// Left edge of every line.
    pub left: u32,

    /// Baselines of the five lines.
    pub baselines: [u32; 5],
}

impl OverlayLayout {
    pub fn for_height(height: u32) -> Self {
        let font_scale = height as f32 / REFERENCE_HEIGHT;
        let cell = ((4.0 * font_scale).round() as u32).max(1);
        let left = (LEFT_MARGIN * font_scale).round() as u32;
        let baselines = [1u32, 2, 3, 4, 5].map(|k| k * height / 16);
        Self {
            cell,
            left,
            baselines,
        }
    }
}

/// Draw the record's values onto the image.
pub fn draw_overlay(image: &mut RgbImage, record: &MatchedRecord) {
    let layout = OverlayLayout::for_height(image.height());
    for (line, &baseline) in overlay_lines(record).iter().zip(&layout.baselines) {
        let top = baseline.saturating_sub(GLYPH_HEIGHT * layout.cell);
        draw_text_line(image, layout.left, top, line, layout.cell);
    }
}

fn draw_text_line(image: &mut RgbImage, x: u32, y: u32, text: &str, cell: u32) {
    let advance = (GLYPH_WIDTH + 1) * cell;
    let mut cursor = x;
    for ch in text.chars() {
        if cursor >= image.width() {
            break;
        }
        draw_char(image, cursor, y, ch.to_ascii_uppercase(), cell);
        cursor += advance;
    }
}

fn draw_char(image: &mut RgbImage, x: u32, y: u32, ch: char, cell: u32) {
    for (row, pattern) in glyph_bits(ch).iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if (pattern >> (GLYPH_WIDTH - 1 - col)) & 1 == 1 {
                fill_cell(image, x + col * cell, y + row as u32 * cell, cell);
            }
        }
    }
}

fn fill_cell(image: &mut RgbImage, x: u32, y: u32, cell: u32) {
    let (width, height) = image.dimensions();
    for py in y..(y + cell).min(height) {
        for px in x..(x + cell).min(width) {
            image.put_pixel(px, py, TEXT_COLOR);
        }
    }
}

const fn glyph_bits(ch: char) -> [u8; 5] {
    match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'R' => [0b111, 0b101, 0b111, 0b110, 0b101],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _ => [0b111, 0b101, 0b010, 0b010, 0b111],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meltview_session_model::sensor::SensorReading;

    fn record() -> MatchedRecord {
        let reading = SensorReading::new(1.0, 12.5, -3.25, 0.04, 1.5);
        MatchedRecord::new(7, 1.2, 3, &reading, 1234.5)
    }

    #[test]
    fn test_lines_use_two_decimals() {
        let lines = overlay_lines(&record());
        assert_eq!(lines[0], "X: 12.50");
        assert_eq!(lines[1], "Y: -3.25");
        assert_eq!(lines[3], "AREA: 1.50");
        assert_eq!(lines[4], "MAX TEMP: 1234.50");
    }

    #[test]
    fn test_layout_at_reference_height() {
        let layout = OverlayLayout::for_height(480);
        assert_eq!(layout.cell, 4);
        assert_eq!(layout.left, 50);
        assert_eq!(layout.baselines, [30, 60, 90, 120, 150]);
    }

    #[test]
    fn test_layout_never_shrinks_below_one_pixel() {
        let layout = OverlayLayout::for_height(32);
        assert_eq!(layout.cell, 1);
        assert_eq!(layout.baselines[4], 10);
    }

    #[test]
    fn test_overlay_draws_only_in_upper_half() {
        let mut image = RgbImage::new(320, 480);
        draw_overlay(&mut image, &record());

        let lit = |y_range: std::ops::Range<u32>| {
            y_range
                .flat_map(|y| (0..320).map(move |x| (x, y)))
                .filter(|&(x, y)| image.get_pixel(x, y).0 == [255, 255, 255])
                .count()
        };
        assert!(lit(0..240) > 0);
        assert_eq!(lit(240..480), 0);
    }

    #[test]
    fn test_overlay_clips_at_image_edge() {
        let mut image = RgbImage::new(40, 16);
        draw_overlay(&mut image, &record());
        assert_eq!(image.dimensions(), (40, 16));
    }
}
