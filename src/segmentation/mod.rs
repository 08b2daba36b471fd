pub mod gmm;
pub mod grabcut;
pub mod graph;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use log::info;

use crate::error::FeatureError;
use crate::models::{Roi, SegmentationMask};

pub use grabcut::grabcut;

/// Seed rectangle inset by `margin` from the image edges
pub fn roi_from_margin(image: &RgbImage, margin: u32) -> Result<Roi, FeatureError> {
    Roi::from_margin(image.width(), image.height(), margin)
}

/// 255 where the label is (probable) foreground, 0 elsewhere
pub fn binary_mask(mask: &SegmentationMask) -> GrayImage {
    mask.to_binary()
}

/// Keep pixels where `mask` is non-zero, black out the rest
pub fn apply_mask(image: &RgbImage, mask: &GrayImage) -> Result<RgbImage, FeatureError> {
    if image.dimensions() != mask.dimensions() {
        return Err(FeatureError::DimensionMismatch {
            mask: mask.dimensions(),
            image: image.dimensions(),
        });
    }
    Ok(RgbImage::from_fn(image.width(), image.height(), |x, y| {
        if mask.get_pixel(x, y)[0] != 0 {
            *image.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    }))
}

/// Segment with a margin-derived seed rectangle and return the label mask with its binary form
pub fn segment(image: &RgbImage, margin: u32, iterations: u32) -> Result<(SegmentationMask, GrayImage), FeatureError> {
    let roi = roi_from_margin(image, margin)?;
    info!("Segmenting with roi {:?}, {} iterations", roi, iterations);
    let mask = grabcut(image, &roi, iterations)?;
    let binary = binary_mask(&mask);
    Ok((mask, binary))
}

/// Shrink `image` so that width + height does not exceed `max_perimeter`.
///
/// `None` and `Some(0)` mean unbounded. Sizes are rounded down, never below one pixel.
pub fn scale_max_perimeter(image: DynamicImage, max_perimeter: Option<u32>) -> DynamicImage {
    let perimeter = image.width() as u64 + image.height() as u64;
    match max_perimeter {
        Some(max) if max > 0 && perimeter > max as u64 => {
            let factor = max as f64 / perimeter as f64;
            let width = ((image.width() as f64 * factor).floor() as u32).max(1);
            let height = ((image.height() as f64 * factor).floor() as u32).max(1);
            info!(
                "Scaling {}x{} to {}x{} (max perimeter {})",
                image.width(),
                image.height(),
                width,
                height,
                max
            );
            image.resize_exact(width, height, FilterType::Triangle)
        }
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_noop_when_unset_or_satisfied() {
        let img = DynamicImage::new_rgb8(40, 30);
        assert_eq!(scale_max_perimeter(img.clone(), None).width(), 40);
        assert_eq!(scale_max_perimeter(img.clone(), Some(0)).width(), 40);
        let same = scale_max_perimeter(img, Some(70));
        assert_eq!((same.width(), same.height()), (40, 30));
    }

    #[test]
    fn test_scale_respects_bound() {
        for (w, h, max) in [(400, 300, 100), (123, 457, 99), (1000, 3, 50), (7, 5, 11)] {
            let scaled = scale_max_perimeter(DynamicImage::new_rgb8(w, h), Some(max));
            let perimeter = scaled.width() + scaled.height();
            assert!(perimeter <= max, "{}x{} -> {} > {}", w, h, perimeter, max);
            assert!(perimeter <= w + h);
        }
    }

    #[test]
    fn test_apply_mask_zeroes_background() {
        let img = RgbImage::from_pixel(3, 1, Rgb([9, 8, 7]));
        let mask = GrayImage::from_raw(3, 1, vec![255, 0, 1]).unwrap();
        let out = apply_mask(&img, &mask).unwrap();
        assert_eq!(out.get_pixel(0, 0), &Rgb([9, 8, 7]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(2, 0), &Rgb([9, 8, 7]));
    }

    #[test]
    fn test_apply_mask_dimension_mismatch() {
        let img = RgbImage::new(3, 3);
        let mask = GrayImage::new(2, 3);
        assert!(apply_mask(&img, &mask).is_err());
    }
}
