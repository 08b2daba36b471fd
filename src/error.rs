//! Argument-validation failures raised by the feature extraction library.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    /// Fewer than two bins were requested.
    #[error("bins must be an integer of at least 2, got {0}")]
    InvalidBins(u32),

    /// The input has no three colour channels.
    #[error("input image must be a color image, got {0:?}")]
    NotColor(image::ColorType),

    #[error("invalid region of interest: {0}")]
    InvalidRoi(String),

    #[error("invalid segmentation label {0}")]
    InvalidLabel(u8),

    /// The seed rectangle left one of the two models without samples.
    #[error("no {0} samples to initialise the color model")]
    NoSamples(&'static str),

    #[error("mask is {mask:?} but image is {image:?}")]
    DimensionMismatch {
        mask: (u32, u32),
        image: (u32, u32),
    },

    #[error("contour has no points")]
    EmptyContour,

    #[error("column count must be at least 1")]
    InvalidColumns,
}
