//! Test image for the multimodal probe.
//!
//! Draws known text with a built-in 5x7 bitmap font so the probe can check
//! whether the model actually read the image.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;

use crate::error::{ApicheckError, Result};

pub const PNG_MIME: &str = "image/png";

const WIDTH: u32 = 360;
const HEIGHT: u32 = 150;
const BACKGROUND: Rgb<u8> = Rgb([173, 216, 230]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// Rows of a 5x7 glyph, high bit on the left
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        ' ' => [0; 7],
        _ => return None,
    };
    Some(rows)
}

/// Draw `text` with its top-left corner at (x, y); unsupported characters leave a gap
fn draw_text(img: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    let advance = (GLYPH_WIDTH + 1) * scale;
    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let origin_x = x + i as u32 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = origin_x + col * scale + dx;
                        let py = y + row as u32 * scale + dy;
                        if px < img.width() && py < img.height() {
                            img.put_pixel(px, py, color);
                        }
                    }
                }
            }
        }
    }
}

/// Encoded image plus its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestImage {
    bytes: Vec<u8>,
    mime_type: String,
}

impl TestImage {
    pub fn from_bytes(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Light blue card with "FINAL TEST" in black and "INTEGRATION CHECK" in red
    pub fn generate() -> Result<Self> {
        let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
        draw_text(&mut img, "FINAL TEST", 20, 20, 4, BLACK);
        draw_text(&mut img, "INTEGRATION CHECK", 20, 80, 3, RED);

        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| ApicheckError::Asset(format!("Failed to encode PNG: {}", e)))?;

        log::debug!("Generated {}x{} test image ({} bytes)", WIDTH, HEIGHT, bytes.len());
        Ok(Self::from_bytes(bytes, PNG_MIME))
    }

    /// Read an image from disk; the MIME type comes from the extension
    pub fn load(path: &Path) -> Result<Self> {
        let mime_type = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => PNG_MIME,
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            _ => {
                return Err(ApicheckError::Asset(format!(
                    "Unsupported image type: {}",
                    path.display()
                )));
            }
        };

        let bytes = std::fs::read(path)
            .map_err(|e| ApicheckError::Asset(format!("Failed to read image {}: {}", path.display(), e)))?;
        Ok(Self::from_bytes(bytes, mime_type))
    }

    /// Configured image if given, otherwise the generated one
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::generate(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_png() {
        let image = TestImage::generate().unwrap();
        assert_eq!(image.mime_type(), PNG_MIME);
        assert_eq!(&image.bytes()[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_generated_pixels() {
        let image = TestImage::generate().unwrap();
        let decoded = image::load_from_memory(image.bytes()).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (WIDTH, HEIGHT));
        assert_eq!(*decoded.get_pixel(0, 0), BACKGROUND);
        // Top bar of the leading 'F'
        assert_eq!(*decoded.get_pixel(20, 20), BLACK);
        // Left stem of the leading 'I' on the second line sits one column in
        assert_eq!(*decoded.get_pixel(20 + 3, 80), RED);
    }

    #[test]
    fn test_text_fits() {
        let second_line = "INTEGRATION CHECK".len() as u32 * (GLYPH_WIDTH + 1) * 3;
        assert!(20 + second_line <= WIDTH);
    }

    #[test]
    fn test_every_drawn_character_has_a_glyph() {
        for c in "FINAL TEST INTEGRATION CHECK".chars() {
            assert!(glyph(c).is_some(), "missing glyph for {c:?}");
        }
    }

    #[test]
    fn test_base64() {
        let image = TestImage::from_bytes(b"hello".to_vec(), PNG_MIME);
        assert_eq!(image.to_base64(), "aGVsbG8=");
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.PNG");
        std::fs::write(&path, b"png-bytes").unwrap();

        let image = TestImage::load(&path).unwrap();
        assert_eq!(image.bytes(), b"png-bytes");
        assert_eq!(image.mime_type(), PNG_MIME);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = TestImage::load(Path::new("/nonexistent/card.png")).unwrap_err();
        assert!(matches!(err, ApicheckError::Asset(_)));
        assert!(err.to_string().contains("/nonexistent/card.png"));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let err = TestImage::load(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, ApicheckError::Asset(_)));
    }
}
