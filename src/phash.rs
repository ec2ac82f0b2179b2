//! 9x9-grid perceptual hash (spec.md §4.3): an 18-byte gradient signature
//! used as PBKDF2 password material for a level's encryption key. Any
//! image decodable to RGBA can be hashed; the asymmetric skip of cell
//! (5,0) is intentional (see module-level doc in spec.md) and preserves a
//! 5x5 gradient grid the horizontal/vertical passes read from.

use image::RgbaImage;

const GRID: u32 = 6;
const READ_GRID: u32 = 5;

/// Luminance-weighted grayscale value for one pixel, per spec.md §4.3 step 2.
#[inline]
fn weighted_gray(px: image::Rgba<u8>) -> u32 {
    3 * px[0] as u32 + 5 * px[1] as u32 + 1 * px[2] as u32
}

struct Window {
    x0: u32,
    y0: u32,
    w: u32,
    h: u32,
}

fn frame_window(width: u32, height: u32) -> Window {
    // 16:9 window centered on the image.
    let target_w = height * 16 / 9;
    if width > target_w {
        let w = target_w.max(1);
        let x0 = (width - w) / 2;
        Window { x0, y0: 0, w, h: height }
    } else {
        let h = (width * 9 / 16).max(1);
        let y0 = (height - h) / 2;
        Window { x0: 0, y0, w: width, h }
    }
}

/// Average weighted luminance over a checkerboard sample of `[min_x, max_x) x [min_y, max_y)`.
fn sample_patch(img: &RgbaImage, min_x: u32, max_x: u32, min_y: u32, max_y: u32) -> f64 {
    let mut sum: u64 = 0;
    let mut count: u64 = 0;
    let mut y2 = min_y;
    while y2 < max_y {
        let start_x = min_x + (y2 % 2);
        let mut x2 = start_x;
        while x2 < max_x {
            let px = *img.get_pixel(x2, y2);
            sum += weighted_gray(px) as u64;
            count += 1;
            x2 += 2;
        }
        y2 += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Compute the 18-byte perceptual hash of a decoded RGBA image.
pub fn perceptual_hash(img: &RgbaImage) -> [u8; 18] {
    let (width, height) = img.dimensions();
    let win = frame_window(width, height);

    let cell_w = win.w as f64 / GRID as f64;
    let cell_h = win.h as f64 / GRID as f64;

    // gray_values[y][x], 6x6, with (5,0) left at 0.0 and never read.
    let mut gray_values = [[0.0f64; GRID as usize]; GRID as usize];

    for gy in 0..GRID {
        for gx in 0..GRID {
            if gx == 5 && gy == 0 {
                continue;
            }
            let cell_x0 = win.x0 as f64 + gx as f64 * cell_w;
            let cell_y0 = win.y0 as f64 + gy as f64 * cell_h;

            let expand_x = cell_w * 0.25;
            let expand_y = cell_h * 0.25;

            let min_x = (cell_x0 - expand_x).max(win.x0 as f64);
            let max_x = (cell_x0 + cell_w + expand_x).min((win.x0 + win.w) as f64);
            let min_y = (cell_y0 - expand_y).max(win.y0 as f64);
            let max_y = (cell_y0 + cell_h + expand_y).min((win.y0 + win.h) as f64);

            let min_x = min_x.round() as u32;
            let max_x = (max_x.round() as u32).max(min_x + 1).min(width);
            let min_y = min_y.round() as u32;
            let max_y = (max_y.round() as u32).max(min_y + 1).min(height);

            gray_values[gy as usize][gx as usize] = sample_patch(img, min_x, max_x, min_y, max_y);
        }
    }

    let mut bits: Vec<bool> = Vec::with_capacity(50);

    // Horizontal pass: rows y=0..4, cols x=0..4.
    for y in 0..READ_GRID {
        for x in 0..READ_GRID {
            bits.push(gray_values[(y + 1) as usize][x as usize] < gray_values[(y + 1) as usize][(x + 1) as usize]);
        }
    }
    // Vertical pass: cols x=0..4, rows y=0..4.
    for x in 0..READ_GRID {
        for y in 0..READ_GRID {
            bits.push(gray_values[y as usize][x as usize] < gray_values[(y + 1) as usize][x as usize]);
        }
    }

    while bits.len() < 144 {
        bits.push(false);
    }

    let mut out = [0u8; 18];
    for (i, byte) in out.iter_mut().enumerate() {
        let mut v = 0u8;
        for b in 0..8 {
            v = (v << 1) | (bits[i * 8 + b] as u8);
        }
        *byte = v;
    }
    out
}
