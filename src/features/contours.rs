use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

use crate::models::Contour;

/// Outer boundaries of the foreground regions (non-zero pixels) that are not nested in a hole
pub fn external_contours(binary: &GrayImage) -> Vec<Contour> {
    find_contours::<u32>(binary)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| Contour::new(c.points))
        .collect()
}

/// The external contour enclosing the largest area; the first one found wins ties
pub fn largest_contour(binary: &GrayImage) -> Option<Contour> {
    let mut best: Option<(f64, Contour)> = None;
    for contour in external_contours(binary) {
        let area = contour.area();
        match &best {
            Some((best_area, _)) if *best_area >= area => {}
            _ => best = Some((area, contour)),
        }
    }
    best.map(|(_, contour)| contour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingRect;
    use image::Luma;

    fn blobs() -> GrayImage {
        GrayImage::from_fn(40, 40, |x, y| {
            let small = (2..6).contains(&x) && (2..6).contains(&y);
            let large = (10..30).contains(&x) && (15..35).contains(&y);
            Luma([if small || large { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_picks_largest_region() {
        let contour = largest_contour(&blobs()).unwrap();
        assert_eq!(
            contour.bounding_rect().unwrap(),
            BoundingRect { x: 10, y: 15, width: 20, height: 20 }
        );
        assert_eq!(external_contours(&blobs()).len(), 2);
    }

    #[test]
    fn test_holes_are_not_external() {
        let ring = GrayImage::from_fn(20, 20, |x, y| {
            let outer = (2..18).contains(&x) && (2..18).contains(&y);
            let hole = (6..14).contains(&x) && (6..14).contains(&y);
            Luma([if outer && !hole { 255 } else { 0 }])
        });
        let contours = external_contours(&ring);
        assert_eq!(contours.len(), 1);
        assert_eq!(
            contours[0].bounding_rect().unwrap(),
            BoundingRect { x: 2, y: 2, width: 16, height: 16 }
        );
    }

    #[test]
    fn test_empty_mask_has_no_contour() {
        assert!(largest_contour(&GrayImage::new(10, 10)).is_none());
    }
}
