use crate::error::FeatureError;
use crate::models::BoundingRect;

/// Half-open pixel range `[x0, x1) x [y0, y1)`, already clipped to the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub x0: u32,
    pub x1: u32,
    pub y0: u32,
    pub y1: u32,
}

impl Band {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }
}

/// Horizontal and vertical bands of the square centred on an object's bounding box.
///
/// The square's side is the longer side of the box; each axis is split into
/// `bins` bands of equal (fractional) width.
#[derive(Debug, Clone)]
pub struct BinSections {
    pub horizontal: Vec<Band>,
    pub vertical: Vec<Band>,
}

impl BinSections {
    pub fn new(rect: &BoundingRect, bins: u32, image_width: u32, image_height: u32) -> Result<Self, FeatureError> {
        if bins < 2 {
            return Err(FeatureError::InvalidBins(bins));
        }

        let centroid_x = (rect.width / 2 + rect.x) as i64;
        let centroid_y = (rect.height / 2 + rect.y) as i64;
        let longest = rect.width.max(rect.height) as i64;
        let incr = longest as f64 / bins as f64;

        let x_start = (centroid_x - longest / 2) as f64;
        let y_start = (centroid_y - longest / 2) as f64;
        let x_end = x_start + longest as f64;
        let y_end = y_start + longest as f64;

        let clip_x = |v: f64| clip(v, image_width);
        let clip_y = |v: f64| clip(v, image_height);

        let mut horizontal = Vec::with_capacity(bins as usize);
        let mut vertical = Vec::with_capacity(bins as usize);
        for i in 0..bins {
            let x = incr * i as f64 + x_start;
            let y = incr * i as f64 + y_start;

            horizontal.push(Band {
                x0: clip_x(x_start),
                x1: clip_x(x_end),
                y0: clip_y(y),
                y1: clip_y(y + incr),
            });
            vertical.push(Band {
                x0: clip_x(x),
                x1: clip_x(x + incr),
                y0: clip_y(y_start),
                y1: clip_y(y_end),
            });
        }

        Ok(Self { horizontal, vertical })
    }

    pub fn bins(&self) -> usize {
        self.horizontal.len()
    }
}

/// Negative boundaries become 0 (no reverse indexing), large ones stop at the image edge
fn clip(v: f64, limit: u32) -> u32 {
    let v = v.max(0.0).floor();
    if v >= limit as f64 { limit } else { v as u32 }
}
