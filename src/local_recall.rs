//! Per-image recall of reference content words, by importance class.
//!
//! For every image, each content word used by the references gets an
//! importance class: the number of references that contain it. A word used by
//! all five MS COCO annotators is class 5. The local recall of class `c` is
//! the fraction of class-`c` words that the system also generated for the same
//! image, aggregated over the corpus.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::annotation::{ImageId, TaggedToken};
use crate::error::{DiversityError, Result};
use crate::frequency::FrequencyTable;
use crate::index::{AlignmentPolicy, CorpusIndex, Sentence, TaggedSentence};

/// Adjective, noun, verb and adverb tags (Penn Treebank).
pub const CONTENT_TAG_PREFIXES: [&str; 4] = ["JJ", "NN", "VB", "RB"];

pub fn is_content_tag(tag: &str) -> bool {
    CONTENT_TAG_PREFIXES.iter().any(|p| tag.starts_with(p))
}

/// Distinct content words of one tagged sentence. Words with an unusable tag
/// are skipped.
pub fn content_words(sentence: &[TaggedToken]) -> BTreeSet<String> {
    sentence
        .iter()
        .filter(|t| is_content_tag(t.tag()))
        .map(|t| t.word().to_owned())
        .collect()
}

/// Content word → number of references using it.
pub fn importance_classes(references: &[TaggedSentence]) -> BTreeMap<String, usize> {
    let mut classes = BTreeMap::new();
    for reference in references {
        for word in content_words(reference) {
            *classes.entry(word).or_insert(0) += 1;
        }
    }
    classes
}

/// Recalled and missed word occurrences, keyed by importance class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalRecallCounts {
    pub recalled: BTreeMap<usize, FrequencyTable>,
    pub missed: BTreeMap<usize, FrequencyTable>,
}

impl LocalRecallCounts {
    fn record(&mut self, class: usize, word: &str, hit: bool) {
        let side = if hit { &mut self.recalled } else { &mut self.missed };
        side.entry(class).or_default().add(word, 1);
    }

    pub fn recalled_in(&self, class: usize) -> u64 {
        self.recalled.get(&class).map_or(0, FrequencyTable::total)
    }

    pub fn missed_in(&self, class: usize) -> u64 {
        self.missed.get(&class).map_or(0, FrequencyTable::total)
    }

    pub fn total_in(&self, class: usize) -> u64 {
        self.recalled_in(class) + self.missed_in(class)
    }

    /// Recall rate of `class`.
    pub fn score(&self, class: usize) -> Result<f64> {
        let total = self.total_in(class);
        if total == 0 {
            return Err(DiversityError::EmptyImportanceClass { class });
        }
        Ok(self.recalled_in(class) as f64 / total as f64)
    }

    /// Recall rates for classes `1..=classes`.
    pub fn scores(&self, classes: usize) -> Result<Vec<f64>> {
        (1..=classes).map(|c| self.score(c)).collect()
    }
}

/// Count recalled and missed content words over the whole corpus.
///
/// Every image of `references` needs an entry in `generated`.
pub fn local_recall_counts(
    generated: &HashMap<ImageId, Sentence>,
    references: &CorpusIndex<TaggedSentence>,
    policy: AlignmentPolicy,
) -> Result<LocalRecallCounts> {
    let slots = references.reference_count(policy)?;
    let mut counts = LocalRecallCounts::default();
    for (image, refs) in references.iter() {
        let output = generated
            .get(&image)
            .ok_or(DiversityError::MissingGeneration { image })?;
        let produced: HashSet<&str> = output.iter().map(String::as_str).collect();
        for (word, class) in importance_classes(&refs[..slots]) {
            counts.record(class, &word, produced.contains(word.as_str()));
        }
    }
    debug!(
        "Local recall over {} images, {} classes",
        references.len(),
        slots
    );
    Ok(counts)
}

/// Local recall blob of one system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalRecall {
    /// Recall for importance classes 1, 2, ... in order.
    pub scores: Vec<f64>,
    pub counts: LocalRecallCounts,
}

impl LocalRecall {
    /// Recall of the class on which all references agree.
    pub fn top_class_score(&self) -> Option<f64> {
        self.scores.last().copied()
    }
}

pub fn local_recall(
    generated: &HashMap<ImageId, Sentence>,
    references: &CorpusIndex<TaggedSentence>,
    policy: AlignmentPolicy,
) -> Result<LocalRecall> {
    let classes = references.reference_count(policy)?;
    let counts = local_recall_counts(generated, references, policy)?;
    Ok(LocalRecall {
        scores: counts.scores(classes)?,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;

    fn generated(entries: &[(ImageId, &str)]) -> HashMap<ImageId, Sentence> {
        entries
            .iter()
            .map(|(id, text)| (*id, text.split_whitespace().map(str::to_owned).collect()))
            .collect()
    }

    fn dog_corpus() -> CorpusIndex<TaggedSentence> {
        let anns = vec![
            Annotation::tagged(42, &[("a", "DT"), ("dog", "NN"), ("runs", "VBZ")]),
            Annotation::tagged(42, &[("the", "DT"), ("Dog", "NN"), ("quickly", "RB")]),
            Annotation::tagged(42, &[("dog", "NNS"), ("outside", "IN")]),
        ];
        CorpusIndex::tagged_from_annotations(&anns, true).unwrap()
    }

    #[test]
    fn content_tags_match_by_prefix() {
        assert!(is_content_tag("NNS"));
        assert!(is_content_tag("VBZ"));
        assert!(is_content_tag("JJR"));
        assert!(is_content_tag("RB"));
        assert!(!is_content_tag("DT"));
        assert!(!is_content_tag(""));
    }

    #[test]
    fn words_count_once_per_reference() {
        let refs = vec![
            vec![TaggedToken::new("dog", "NN"), TaggedToken::new("dog", "NN")],
            vec![TaggedToken::new("dog", "NN")],
        ];
        assert_eq!(importance_classes(&refs)["dog"], 2);
    }

    #[test]
    fn agreed_word_recalled_in_class_three() {
        let counts = local_recall_counts(
            &generated(&[(42, "a dog sits")]),
            &dog_corpus(),
            AlignmentPolicy::Strict,
        )
        .unwrap();
        assert_eq!(counts.recalled[&3].get("dog"), 1);
        assert_eq!(counts.missed_in(3), 0);
        assert_eq!(counts.missed[&1].get("runs"), 1);
        assert_eq!(counts.missed[&1].get("quickly"), 1);
        assert_eq!(counts.score(3), Ok(1.0));
        assert_eq!(counts.score(1), Ok(0.0));
    }

    #[test]
    fn agreed_word_missed_in_class_three() {
        let counts = local_recall_counts(
            &generated(&[(42, "a cat")]),
            &dog_corpus(),
            AlignmentPolicy::Strict,
        )
        .unwrap();
        assert_eq!(counts.missed[&3].get("dog"), 1);
        assert_eq!(counts.score(3), Ok(0.0));
    }

    #[test]
    fn empty_class_is_an_error() {
        let result = local_recall(
            &generated(&[(42, "dog")]),
            &dog_corpus(),
            AlignmentPolicy::Strict,
        );
        // nothing is used by exactly two references
        assert_eq!(
            result.unwrap_err(),
            DiversityError::EmptyImportanceClass { class: 2 }
        );
    }

    #[test]
    fn missing_generation_fails_loudly() {
        let err = local_recall_counts(
            &generated(&[(7, "dog")]),
            &dog_corpus(),
            AlignmentPolicy::Strict,
        )
        .unwrap_err();
        assert_eq!(err, DiversityError::MissingGeneration { image: 42 });
    }

    #[test]
    fn scores_aggregate_over_images() {
        let anns = vec![
            Annotation::tagged(1, &[("dog", "NN")]),
            Annotation::tagged(1, &[("dog", "NN"), ("red", "JJ")]),
            Annotation::tagged(2, &[("cat", "NN"), ("big", "JJ")]),
            Annotation::tagged(2, &[("cat", "NN")]),
        ];
        let index = CorpusIndex::tagged_from_annotations(&anns, true).unwrap();
        let recall = local_recall(
            &generated(&[(1, "dog red"), (2, "a big dog")]),
            &index,
            AlignmentPolicy::Strict,
        )
        .unwrap();
        // class 1: red (hit), big (hit); class 2: dog (hit), cat (miss)
        assert_eq!(recall.scores, vec![1.0, 0.5]);
        assert_eq!(recall.top_class_score(), Some(0.5));
    }
}
