//! Thumbnail generation and common-prefix factoring (spec.md §4.5,
//! Design Notes open question on the 1000-byte cap).

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, GenericImageView, RgbaImage};

const THUMB_SIZE: u32 = 64;
const JPEG_QUALITY: u8 = 50;
const DESATURATION: f32 = 0.25;
const PREFIX_SEARCH_CAP: usize = 1000;

/// Resize to 64x64, desaturate 25%, and JPEG-encode at quality 50.
pub fn make_thumbnail(source: &RgbaImage) -> Result<Vec<u8>, String> {
    let resized = image::imageops::resize(
        source,
        THUMB_SIZE,
        THUMB_SIZE,
        image::imageops::FilterType::Lanczos3,
    );
    let desaturated = desaturate(&resized, DESATURATION);

    let mut rgb = Vec::with_capacity((THUMB_SIZE * THUMB_SIZE * 3) as usize);
    for (_, _, px) in desaturated.pixels() {
        rgb.extend_from_slice(&[px[0], px[1], px[2]]);
    }

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder
        .encode(&rgb, THUMB_SIZE, THUMB_SIZE, ExtendedColorType::Rgb8)
        .map_err(|e| format!("jpeg encode failed: {e}"))?;
    Ok(out)
}

/// Blend each pixel `amount` of the way toward its luminance-gray value.
fn desaturate(img: &RgbaImage, amount: f32) -> RgbaImage {
    let mut out = img.clone();
    for px in out.pixels_mut() {
        let gray = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
        px[0] = ((1.0 - amount) * px[0] as f32 + amount * gray).round() as u8;
        px[1] = ((1.0 - amount) * px[1] as f32 + amount * gray).round() as u8;
        px[2] = ((1.0 - amount) * px[2] as f32 + amount * gray).round() as u8;
    }
    out
}

/// Longest common byte prefix across all thumbnails, capped at 1000 bytes.
/// If any two thumbnails disagree on byte 0, the prefix is empty — never
/// assigned, which is the correct, explicit handling (spec.md §9).
pub fn common_prefix(thumbnails: &[Vec<u8>]) -> Vec<u8> {
    let Some(first) = thumbnails.first() else {
        return Vec::new();
    };
    let max_len = thumbnails
        .iter()
        .map(|t| t.len())
        .min()
        .unwrap_or(0)
        .min(PREFIX_SEARCH_CAP);

    let mut t = 0;
    while t < max_len && thumbnails.iter().all(|thumb| thumb[t] == first[t]) {
        t += 1;
    }
    first[..t].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn prefix_of_identical_thumbnails_is_the_whole_capped_thing() {
        let t = vec![1u8, 2, 3, 4, 5];
        let thumbs = vec![t.clone(), t.clone(), t.clone()];
        assert_eq!(common_prefix(&thumbs), t);
    }

    #[test]
    fn prefix_stops_at_first_disagreement() {
        let a = vec![1u8, 2, 3, 9, 9];
        let b = vec![1u8, 2, 3, 8, 8];
        assert_eq!(common_prefix(&[a, b]), vec![1, 2, 3]);
    }

    #[test]
    fn empty_prefix_when_byte_zero_disagrees() {
        let a = vec![1u8, 2, 3];
        let b = vec![9u8, 2, 3];
        assert_eq!(common_prefix(&[a, b]), Vec::<u8>::new());
    }

    #[test]
    fn prefix_and_stripped_tail_recombine_to_original() {
        let a = vec![1u8, 2, 3, 4, 5];
        let b = vec![1u8, 2, 3, 9, 9];
        let prefix = common_prefix(&[a.clone(), b.clone()]);
        let tail_a = &a[prefix.len()..];
        let mut recombined = prefix.clone();
        recombined.extend_from_slice(tail_a);
        assert_eq!(recombined, a);
    }

    #[test]
    fn thumbnail_is_a_decodable_jpeg() {
        let src = RgbaImage::from_fn(128, 96, |x, y| Rgba([(x % 255) as u8, (y % 255) as u8, 100, 255]));
        let jpeg = make_thumbnail(&src).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));
    }
}
