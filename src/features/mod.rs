pub mod contours;
pub mod draw;
pub mod sections;

use std::io::{self, Write};

use image::{DynamicImage, GenericImageView, GrayImage, RgbImage};
use log::debug;

use crate::error::FeatureError;
use crate::models::Contour;

pub use contours::largest_contour;
pub use draw::{draw_roi, draw_sections};
pub use sections::{Band, BinSections};

/// Mean colour per horizontal and per vertical bin, as concatenated B, G, R triples
#[derive(Debug, Clone, PartialEq)]
pub struct BinMeans {
    pub horizontal: Vec<f64>,
    pub vertical: Vec<f64>,
}

impl BinMeans {
    pub fn bins(&self) -> usize {
        self.horizontal.len() / 3
    }

    /// Horizontal values followed by vertical values, `2 * 3 * bins` in total
    pub fn to_row(&self) -> Vec<f64> {
        self.horizontal.iter().chain(&self.vertical).copied().collect()
    }

    /// `h\tv` header, then one line per channel value pairing both directions
    pub fn write_tsv<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "h\tv")?;
        for (h, v) in self.horizontal.iter().zip(&self.vertical) {
            writeln!(out, "{}\t{}", h, v)?;
        }
        Ok(())
    }
}

/// BGR means of the foreground pixels in each bin of the object's bounding square.
///
/// Only pixels where `mask` is non-zero count; a bin without any such pixel
/// reports zero for every channel.
pub fn color_bgr_means(
    image: &DynamicImage,
    mask: &GrayImage,
    contour: &Contour,
    bins: u32,
) -> Result<BinMeans, FeatureError> {
    if bins < 2 {
        return Err(FeatureError::InvalidBins(bins));
    }
    if !image.color().has_color() {
        return Err(FeatureError::NotColor(image.color()));
    }
    if image.dimensions() != mask.dimensions() {
        return Err(FeatureError::DimensionMismatch {
            mask: mask.dimensions(),
            image: image.dimensions(),
        });
    }
    let rect = contour.bounding_rect().ok_or(FeatureError::EmptyContour)?;

    let rgb = image.to_rgb8();
    let sections = BinSections::new(&rect, bins, rgb.width(), rgb.height())?;
    debug!("Bounding rect {:?}, {} bins", rect, bins);

    let mut horizontal = Vec::with_capacity(bins as usize * 3);
    let mut vertical = Vec::with_capacity(bins as usize * 3);
    for band in &sections.horizontal {
        horizontal.extend(band_bgr_mean(&rgb, mask, band));
    }
    for band in &sections.vertical {
        vertical.extend(band_bgr_mean(&rgb, mask, band));
    }

    Ok(BinMeans { horizontal, vertical })
}

fn band_bgr_mean(image: &RgbImage, mask: &GrayImage, band: &Band) -> [f64; 3] {
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for y in band.y0..band.y1 {
        for x in band.x0..band.x1 {
            if mask.get_pixel(x, y)[0] == 0 {
                continue;
            }
            let p = image.get_pixel(x, y);
            sum[0] += p[2] as u64;
            sum[1] += p[1] as u64;
            sum[2] += p[0] as u64;
            count += 1;
        }
    }
    if count == 0 {
        return [0.0; 3];
    }
    sum.map(|s| s as f64 / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};
    use imageproc::point::Point;

    fn rectangle_contour(x0: u32, y0: u32, x1: u32, y1: u32) -> Contour {
        Contour::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    #[test]
    fn test_uniform_object_means() {
        let img = RgbImage::from_fn(40, 30, |x, y| {
            if (5..25).contains(&x) && (10..20).contains(&y) {
                Rgb([30, 120, 210])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let mask = GrayImage::from_fn(40, 30, |x, y| {
            Luma([if img.get_pixel(x, y)[0] != 0 { 255 } else { 0 }])
        });
        let contour = rectangle_contour(5, 10, 24, 19);
        let means = color_bgr_means(&DynamicImage::ImageRgb8(img), &mask, &contour, 5).unwrap();

        assert_eq!(means.bins(), 5);
        assert_eq!(means.to_row().len(), 2 * 3 * 5);
        for triple in means.horizontal.chunks(3).chain(means.vertical.chunks(3)) {
            if triple.iter().all(|&v| v == 0.0) {
                // bands of the bounding square that miss the object
                continue;
            }
            assert!((triple[0] - 210.0).abs() < 1e-9);
            assert!((triple[1] - 120.0).abs() < 1e-9);
            assert!((triple[2] - 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_gray_image() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        let mask = GrayImage::new(4, 4);
        let err = color_bgr_means(&img, &mask, &rectangle_contour(0, 0, 3, 3), 2).unwrap_err();
        assert!(matches!(err, FeatureError::NotColor(_)));
    }

    #[test]
    fn test_rejects_single_bin() {
        let img = DynamicImage::new_rgb8(4, 4);
        let mask = GrayImage::new(4, 4);
        let err = color_bgr_means(&img, &mask, &rectangle_contour(0, 0, 3, 3), 1).unwrap_err();
        assert!(matches!(err, FeatureError::InvalidBins(1)));
    }

    #[test]
    fn test_tsv_layout() {
        let means = BinMeans {
            horizontal: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vertical: vec![6.5, 5.0, 4.0, 3.0, 2.0, 1.0],
        };
        let mut out = Vec::new();
        means.write_tsv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 6);
        assert_eq!(lines[0], "h\tv");
        assert_eq!(lines[1], "1\t6.5");
    }
}
