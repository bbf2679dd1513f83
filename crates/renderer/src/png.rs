//! PNG encoding for finished map images.
//!
//! Maps are mostly flat color fills, so most frames fit in a 256-entry
//! palette and are written as indexed PNG (color type 3). Frames with more
//! colors, such as anti-aliased text over smooth gradients, fall back to
//! RGBA (color type 6).

use std::collections::HashMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbaImage;
use rayon::prelude::*;

use crate::error::{RenderError, Result};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG
const MAX_PALETTE_SIZE: usize = 256;

/// Rows per parallel work unit when mapping pixels to palette indices.
const ROWS_PER_TASK: usize = 32;

type Rgba = [u8; 4];

/// Encode an image, choosing indexed output when the palette allows it.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidCanvas { width, height });
    }

    match extract_palette(img) {
        Some((palette, indices)) => encode_indexed(width, height, &palette, &indices),
        None => encode_rgba(img),
    }
}

/// Collect at most 256 distinct colors, then map every pixel to its index.
fn extract_palette(img: &RgbaImage) -> Option<(Vec<Rgba>, Vec<u8>)> {
    let mut lookup: HashMap<Rgba, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<Rgba> = Vec::with_capacity(MAX_PALETTE_SIZE);

    for pixel in img.pixels() {
        if lookup.contains_key(&pixel.0) {
            continue;
        }
        if palette.len() == MAX_PALETTE_SIZE {
            return None;
        }
        lookup.insert(pixel.0, palette.len() as u8);
        palette.push(pixel.0);
    }

    let row_bytes = img.width() as usize * 4;
    let raw = img.as_raw();
    let indices: Vec<u8> = raw
        .par_chunks(row_bytes * ROWS_PER_TASK)
        .flat_map_iter(|rows| {
            rows.chunks_exact(4)
                .map(|px| lookup.get(px).copied().unwrap_or(0))
                .collect::<Vec<_>>()
        })
        .collect();

    Some((palette, indices))
}

fn encode_indexed(width: u32, height: u32, palette: &[Rgba], indices: &[u8]) -> Result<Vec<u8>> {
    let mut png = SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &header(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width as usize)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn encode_rgba(img: &RgbaImage) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    let mut png = SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &header(width, height, 6));

    let idat = deflate_scanlines(img.as_raw(), width as usize * 4)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// IHDR payload: 8-bit depth, no interlace.
fn header(width: u32, height: u32, color_type: u8) -> Vec<u8> {
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, color_type, 0, 0, 0]);
    ihdr
}

/// Prefix each scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize) -> Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(data.len() + data.len() / row_bytes.max(1));
    for row in data.chunks(row_bytes) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&raw)
        .and_then(|_| encoder.finish())
        .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))
}

fn write_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(kind);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba as Px;

    fn color_type(png: &[u8]) -> u8 {
        // signature(8) + length(4) + "IHDR"(4) + width(4) + height(4) + depth(1)
        png[25]
    }

    #[test]
    fn test_few_colors_encode_indexed() {
        let img = RgbaImage::from_fn(64, 32, |x, _| {
            if x < 32 {
                Px([255, 255, 255, 255])
            } else {
                Px([8, 48, 107, 255])
            }
        });
        let png = encode_png(&img).unwrap();
        assert_eq!(&png[..8], &SIGNATURE);
        assert_eq!(color_type(&png), 3);

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_many_colors_fall_back_to_rgba() {
        let img = RgbaImage::from_fn(64, 64, |x, y| Px([(x * 4) as u8, (y * 4) as u8, 0, 255]));
        let png = encode_png(&img).unwrap();
        assert_eq!(color_type(&png), 6);

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_transparency_is_kept() {
        let img = RgbaImage::from_fn(4, 4, |x, _| {
            if x % 2 == 0 {
                Px([0, 0, 0, 0])
            } else {
                Px([255, 0, 0, 255])
            }
        });
        let png = encode_png(&img).unwrap();
        assert!(png.windows(4).any(|w| w == b"tRNS"));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let img = RgbaImage::new(0, 0);
        assert!(matches!(
            encode_png(&img),
            Err(RenderError::InvalidCanvas { .. })
        ));
    }
}
