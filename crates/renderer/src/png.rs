//! PNG encoding for RGBA image data.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: Used when the image has ≤256 unique colors.
//! - **RGBA PNG (color type 6)**: Fallback for images with >256 colors.
//!
//! Output is a pure function of the pixel data: the palette is ordered by
//! first appearance in scan order, so equal images give equal bytes.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use map_common::{MapError, MapResult};
use rayon::prelude::*;
use tiny_skia::Pixmap;

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from a parallel color count
const PARALLEL_THRESHOLD: usize = 4096;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

type Rgba = (u8, u8, u8, u8);

/// Encode a rendered pixmap, converting tiny-skia's premultiplied storage to
/// straight alpha first.
pub fn encode_pixmap(pixmap: &Pixmap) -> MapResult<Vec<u8>> {
    let mut pixels = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    encode_png(&pixels, pixmap.width() as usize, pixmap.height() as usize)
}

/// Encode RGBA pixels, picking indexed mode when the colors fit a palette.
pub fn encode_png(pixels: &[u8], width: usize, height: usize) -> MapResult<Vec<u8>> {
    check_dimensions(pixels.len(), 4, width, height)?;

    match extract_palette(pixels) {
        Some((palette, indices)) => encode_indexed(width, height, &palette, &indices),
        None => encode_rgba(pixels, width, height),
    }
}

#[inline(always)]
fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

fn extract_palette(pixels: &[u8]) -> Option<(Vec<Rgba>, Vec<u8>)> {
    if pixels.len() / 4 >= PARALLEL_THRESHOLD && exceeds_palette_parallel(pixels) {
        return None;
    }
    extract_palette_sequential(pixels)
}

/// Parallel pre-check: true when the image certainly has too many colors.
fn exceeds_palette_parallel(pixels: &[u8]) -> bool {
    let chunk_size = (pixels.len() / 4 / rayon::current_num_threads()).max(256) * 4;

    let local_sets: Vec<Option<HashSet<u32>>> = pixels
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut local = HashSet::with_capacity(MAX_PALETTE_SIZE);
            for pixel in chunk.chunks_exact(4) {
                local.insert(pack_color(pixel[0], pixel[1], pixel[2], pixel[3]));
                if local.len() > MAX_PALETTE_SIZE {
                    return None;
                }
            }
            Some(local)
        })
        .collect();

    let mut global: HashSet<u32> = HashSet::with_capacity(MAX_PALETTE_SIZE);
    for local in local_sets {
        let Some(local) = local else {
            return true;
        };
        global.extend(local);
        if global.len() > MAX_PALETTE_SIZE {
            return true;
        }
    }
    false
}

/// Palette in first-seen order plus one index per pixel.
fn extract_palette_sequential(pixels: &[u8]) -> Option<(Vec<Rgba>, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<Rgba> = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.len() / 4);

    for chunk in pixels.chunks_exact(4) {
        let packed = pack_color(chunk[0], chunk[1], chunk[2], chunk[3]);

        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push((chunk[0], chunk[1], chunk[2], chunk[3]));
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Indexed PNG (color type 3) from a palette and one index per pixel.
pub fn encode_indexed(
    width: usize,
    height: usize,
    palette: &[Rgba],
    indices: &[u8],
) -> MapResult<Vec<u8>> {
    check_dimensions(indices.len(), 1, width, height)?;
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(MapError::Render(format!(
            "palette must hold 1..={} colors, got {}",
            MAX_PALETTE_SIZE,
            palette.len()
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    // tRNS only when some entry is not opaque
    if palette.iter().any(|&(_, _, _, a)| a < 255) {
        let trns: Vec<u8> = palette.iter().map(|&(_, _, _, a)| a).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Truecolor-with-alpha PNG (color type 6).
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> MapResult<Vec<u8>> {
    check_dimensions(pixels.len(), 4, width, height)?;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));

    let idat = deflate_scanlines(pixels, width * 4, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn check_dimensions(len: usize, bytes_per_pixel: usize, width: usize, height: usize) -> MapResult<()> {
    if width == 0 || height == 0 {
        return Err(MapError::Render(format!(
            "image dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }
    if width > u32::MAX as usize || height > u32::MAX as usize {
        return Err(MapError::Render(format!("image {}x{} too large", width, height)));
    }
    let expected = width * height * bytes_per_pixel;
    if len != expected {
        return Err(MapError::Render(format!(
            "expected {} bytes for {}x{} image, got {}",
            expected, width, height, len
        )));
    }
    Ok(())
}

fn ihdr(width: usize, height: usize, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    data[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter and interlace methods stay 0
    data
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix every row with filter type 0 and zlib-compress the lot.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> MapResult<Vec<u8>> {
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(&uncompressed)
        .and_then(|_| encoder.finish())
        .map_err(|e| MapError::Render(format!("IDAT compression failed: {}", e)))
}
