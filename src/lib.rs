pub mod core;
pub mod error;
pub mod features;
pub mod models;
pub mod segmentation;

pub use error::FeatureError;
pub use features::{color_bgr_means, draw_sections, largest_contour, BinMeans, BinSections};
pub use models::{BoundingRect, Contour, Label, Roi, SegmentationMask};
pub use segmentation::{apply_mask, binary_mask, grabcut, scale_max_perimeter, segment};
