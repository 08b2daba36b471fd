use image::GrayImage;
use imageproc::point::Point;

use crate::error::FeatureError;

/// Rectangular seed region (x, y, width, height) in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle inset by `margin` pixels from every edge of a `width` x `height` image
    pub fn from_margin(width: u32, height: u32, margin: u32) -> Result<Self, FeatureError> {
        let inset = margin.saturating_mul(2);
        if inset >= width || inset >= height {
            return Err(FeatureError::InvalidRoi(format!(
                "margin {} leaves no foreground area in a {}x{} image",
                margin, width, height
            )));
        }
        Ok(Self::new(margin, margin, width - inset, height - inset))
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// Per-pixel segmentation label. Discriminants follow the usual GrabCut mask convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Label {
    Background = 0,
    Foreground = 1,
    ProbableBackground = 2,
    ProbableForeground = 3,
}

impl Label {
    pub fn is_foreground(self) -> bool {
        matches!(self, Label::Foreground | Label::ProbableForeground)
    }

    pub fn is_probable(self) -> bool {
        matches!(self, Label::ProbableBackground | Label::ProbableForeground)
    }
}

impl TryFrom<u8> for Label {
    type Error = FeatureError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Label::Background),
            1 => Ok(Label::Foreground),
            2 => Ok(Label::ProbableBackground),
            3 => Ok(Label::ProbableForeground),
            other => Err(FeatureError::InvalidLabel(other)),
        }
    }
}

/// Row-major grid of segmentation labels
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    labels: Vec<Label>,
}

impl SegmentationMask {
    pub fn filled(width: u32, height: u32, label: Label) -> Self {
        Self {
            width,
            height,
            labels: vec![label; width as usize * height as usize],
        }
    }

    /// Everything outside `roi` is background, everything inside probable foreground
    pub fn from_roi(width: u32, height: u32, roi: &Roi) -> Self {
        let mut mask = Self::filled(width, height, Label::Background);
        for y in roi.y..roi.y + roi.height {
            for x in roi.x..roi.x + roi.width {
                mask.set(x, y, Label::ProbableForeground);
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Label {
        self.labels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, label: Label) {
        let idx = self.index(x, y);
        self.labels[idx] = label;
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub(crate) fn labels_mut(&mut self) -> &mut [Label] {
        &mut self.labels
    }

    pub fn count(&self, label: Label) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// 255 for (probable) foreground, 0 for (probable) background
    pub fn to_binary(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x, y).is_foreground() {
                image::Luma([255])
            } else {
                image::Luma([0])
            }
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Axis-aligned bounding rectangle, inclusive pixel convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Ordered boundary points of one outer region
#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<Point<u32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<u32>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounding_rect(&self) -> Option<BoundingRect> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(BoundingRect {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }

    /// Polygon area enclosed by the boundary points (shoelace formula)
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            twice += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
        }
        (twice / 2.0).abs()
    }
}
