use thiserror::Error;

use crate::annotation::ImageId;

/// Failures of the scoring library.
///
/// Every ratio or average over zero items ends up here instead of producing
/// `NaN`, and so does every alignment problem between references and
/// generated output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiversityError {
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("no complete window of {window} items (only {available} available)")]
    NoCompleteWindow { window: usize, available: usize },

    #[error("image {image} has {found} references, expected {expected}")]
    UnevenReferences {
        image: ImageId,
        expected: usize,
        found: usize,
    },

    #[error("no generated description for image {image}")]
    MissingGeneration { image: ImageId },

    #[error("annotation for image {image} carries no POS tags")]
    MissingTags { image: ImageId },

    #[error("importance class {class} has no reference words")]
    EmptyImportanceClass { class: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DiversityError>;
