//! Per-image index of parallel reference descriptions.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::annotation::{lower_tagged, lower_tokens, Annotation, ImageId, TaggedToken};
use crate::error::{DiversityError, Result};

pub type Sentence = Vec<String>;
pub type TaggedSentence = Vec<TaggedToken>;

/// What to do when images carry different numbers of references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlignmentPolicy {
    /// Fail on the first image whose count differs from the first image's.
    #[default]
    Strict,
    /// Keep only the first `min` references of every image.
    Truncate,
}

/// Image → references, in first-seen image order and arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusIndex<T> {
    entries: IndexMap<ImageId, Vec<T>>,
}

impl<T> Default for CorpusIndex<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl CorpusIndex<Sentence> {
    /// Index of token sequences.
    pub fn from_annotations(annotations: &[Annotation], lower: bool) -> Self {
        let mut index = Self::default();
        for a in annotations {
            index.push(a.image_id, lower_tokens(&a.tokenized, lower));
        }
        index
    }
}

impl CorpusIndex<TaggedSentence> {
    /// Index of tagged sequences; every annotation must carry tags.
    pub fn tagged_from_annotations(annotations: &[Annotation], lower: bool) -> Result<Self> {
        let mut index = Self::default();
        for a in annotations {
            let tagged = a
                .tagged
                .as_ref()
                .ok_or(DiversityError::MissingTags { image: a.image_id })?;
            index.push(a.image_id, lower_tagged(tagged, lower));
        }
        Ok(index)
    }
}

impl CorpusIndex<Annotation> {
    /// Whole annotations grouped per image, for statistics that need more
    /// than the tokens.
    pub fn grouped(annotations: &[Annotation]) -> Self {
        let mut index = Self::default();
        for a in annotations {
            index.push(a.image_id, a.clone());
        }
        index
    }
}

impl<T: Clone> CorpusIndex<T> {
    pub fn push(&mut self, image: ImageId, reference: T) {
        self.entries.entry(image).or_default().push(reference);
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, image: ImageId) -> Option<&[T]> {
        self.entries.get(&image).map(Vec::as_slice)
    }

    pub fn images(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageId, &[T])> {
        self.entries.iter().map(|(id, refs)| (*id, refs.as_slice()))
    }

    /// The per-image reference count under `policy`.
    pub fn reference_count(&self, policy: AlignmentPolicy) -> Result<usize> {
        let mut iter = self.entries.iter();
        let Some((_, first)) = iter.next() else {
            return Err(DiversityError::EmptyInput("corpus index"));
        };
        let expected = first.len();
        match policy {
            AlignmentPolicy::Strict => {
                for (image, refs) in iter {
                    if refs.len() != expected {
                        return Err(DiversityError::UnevenReferences {
                            image: *image,
                            expected,
                            found: refs.len(),
                        });
                    }
                }
                Ok(expected)
            }
            AlignmentPolicy::Truncate => {
                Ok(iter.map(|(_, refs)| refs.len()).fold(expected, usize::min))
            }
        }
    }

    /// N collections (one per annotator slot) of M sentences (one per image).
    pub fn parallel(&self, policy: AlignmentPolicy) -> Result<Vec<Vec<T>>> {
        let slots = self.reference_count(policy)?;
        if slots == 0 {
            return Err(DiversityError::EmptyInput("image without references"));
        }
        let dropped: usize = self.entries.values().map(|refs| refs.len() - slots).sum();
        if dropped > 0 {
            warn!("Truncated to {slots} references per image, dropped {dropped} references");
        }
        let parallel = (0..slots)
            .map(|slot| {
                self.entries
                    .values()
                    .map(|refs| refs[slot].clone())
                    .collect()
            })
            .collect();
        Ok(parallel)
    }
}

/// Generated output: image → token sequence. Later entries win.
pub fn mapping_from_annotations(
    annotations: &[Annotation],
    lower: bool,
) -> HashMap<ImageId, Sentence> {
    let mut mapping = HashMap::with_capacity(annotations.len());
    for a in annotations {
        if mapping
            .insert(a.image_id, lower_tokens(&a.tokenized, lower))
            .is_some()
        {
            debug!("Duplicate generated description for image {}", a.image_id);
        }
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Annotation> {
        vec![
            Annotation::new(7, &["A", "cat"]),
            Annotation::new(3, &["a", "dog"]),
            Annotation::new(7, &["the", "Cat"]),
            Annotation::new(3, &["one", "dog"]),
        ]
    }

    #[test]
    fn keeps_first_seen_image_order() {
        let index = CorpusIndex::from_annotations(&corpus(), true);
        assert_eq!(index.images().collect::<Vec<_>>(), vec![7, 3]);
        assert_eq!(index.get(7).unwrap()[1], vec!["the", "cat"]);
    }

    #[test]
    fn case_sensitive_index_keeps_tokens() {
        let index = CorpusIndex::from_annotations(&corpus(), false);
        assert_eq!(index.get(7).unwrap()[0], vec!["A", "cat"]);
    }

    #[test]
    fn parallel_view_aligns_slots() {
        let index = CorpusIndex::from_annotations(&corpus(), true);
        let parallel = index.parallel(AlignmentPolicy::Strict).unwrap();
        assert_eq!(parallel.len(), 2);
        assert_eq!(parallel[0], vec![vec!["a", "cat"], vec!["a", "dog"]]);
        assert_eq!(parallel[1], vec![vec!["the", "cat"], vec!["one", "dog"]]);
    }

    #[test]
    fn strict_policy_rejects_uneven_references() {
        let mut anns = corpus();
        anns.push(Annotation::new(3, &["extra"]));
        let index = CorpusIndex::from_annotations(&anns, true);
        assert_eq!(
            index.parallel(AlignmentPolicy::Strict),
            Err(DiversityError::UnevenReferences {
                image: 3,
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn truncate_policy_drops_extra_references() {
        let mut anns = corpus();
        anns.push(Annotation::new(3, &["extra"]));
        let index = CorpusIndex::from_annotations(&anns, true);
        let parallel = index.parallel(AlignmentPolicy::Truncate).unwrap();
        assert_eq!(parallel.len(), 2);
        assert!(parallel.iter().all(|slot| slot.len() == 2));
    }

    #[test]
    fn empty_index_is_an_error() {
        let index = CorpusIndex::<Sentence>::default();
        assert!(matches!(
            index.parallel(AlignmentPolicy::Strict),
            Err(DiversityError::EmptyInput(_))
        ));
    }

    #[test]
    fn tagged_index_requires_tags() {
        let anns = vec![Annotation::new(1, &["dog"])];
        assert_eq!(
            CorpusIndex::tagged_from_annotations(&anns, true),
            Err(DiversityError::MissingTags { image: 1 })
        );
    }

    #[test]
    fn grouped_annotations_align_like_sentences() {
        let index = CorpusIndex::grouped(&corpus());
        let parallel = index.parallel(AlignmentPolicy::Strict).unwrap();
        assert_eq!(parallel[1][0].tokenized, vec!["the", "Cat"]);
        assert_eq!(parallel[1][1].image_id, 3);
    }

    #[test]
    fn later_generated_entries_win() {
        let anns = vec![Annotation::new(1, &["a"]), Annotation::new(1, &["B"])];
        let mapping = mapping_from_annotations(&anns, true);
        assert_eq!(mapping[&1], vec!["b"]);
    }
}
