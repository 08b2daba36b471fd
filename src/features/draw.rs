use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::sections::{Band, BinSections};
use crate::models::Roi;

pub const HORIZONTAL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const VERTICAL_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const ROI_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

fn draw_band(image: &mut RgbImage, band: &Band, color: Rgb<u8>) {
    if band.is_empty() {
        return;
    }
    let rect = Rect::at(band.x0 as i32, band.y0 as i32).of_size(band.width(), band.height());
    draw_hollow_rect_mut(image, rect, color);
}

/// Outline the bins on `image`: horizontal bands in green, vertical bands in red.
/// With `only`, just the listed bin indices are drawn.
pub fn draw_sections(image: &mut RgbImage, sections: &BinSections, only: Option<&[usize]>) {
    let bands = sections.horizontal.iter().zip(&sections.vertical).enumerate();
    for (i, (horizontal, vertical)) in bands {
        if only.is_some_and(|keep| !keep.contains(&i)) {
            continue;
        }
        draw_band(image, horizontal, HORIZONTAL_COLOR);
        draw_band(image, vertical, VERTICAL_COLOR);
    }
}

/// Outline the segmentation seed rectangle
pub fn draw_roi(image: &mut RgbImage, roi: &Roi) {
    if roi.width == 0 || roi.height == 0 {
        return;
    }
    let rect = Rect::at(roi.x as i32, roi.y as i32).of_size(roi.width, roi.height);
    draw_hollow_rect_mut(image, rect, ROI_COLOR);
}

/// `left` and `right` next to each other on one canvas
pub fn side_by_side(left: &RgbImage, right: &RgbImage) -> RgbImage {
    let mut canvas = RgbImage::new(left.width() + right.width(), left.height().max(right.height()));
    image::imageops::replace(&mut canvas, left, 0, 0);
    image::imageops::replace(&mut canvas, right, left.width() as i64, 0);
    canvas
}
