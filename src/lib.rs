//! Lexical diversity and vocabulary recall of image description systems.
//!
//! The pipeline: load reference and generated annotations, index the
//! references per image, then compute type/token statistics, novelty against
//! the training descriptions, global (corpus-wide) recall and local
//! (per-image) recall. Results are plain serde values; the binaries under
//! `src/bin` persist them as JSON and CSV.

pub mod annotation;
pub mod compounds;
pub mod config;
pub mod error;
pub mod frequency;
pub mod global_recall;
pub mod index;
pub mod io;
pub mod local_recall;
pub mod logging;
pub mod novelty;
pub mod ranking;
pub mod stats;

pub use annotation::{Annotation, AnnotationFile, ImageId, TaggedToken};
pub use config::StatsConfig;
pub use error::{DiversityError, Result};
pub use frequency::FrequencyTable;
pub use index::{AlignmentPolicy, CorpusIndex, Sentence, TaggedSentence};
