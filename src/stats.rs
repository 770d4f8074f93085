//! Type/token statistics over sentence collections.
//!
//! Every function takes a flat collection of tokenized sentences. The
//! `parallel_*` variants take one collection per annotator slot (see
//! [`crate::index::CorpusIndex::parallel`]), compute the metric per slot and
//! average the results.
//!
//! Ratios over zero items fail with [`DiversityError::EmptyInput`]; windowed
//! ratios without a single complete window fail with
//! [`DiversityError::NoCompleteWindow`].

use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::StatsConfig;
use crate::error::{DiversityError, Result};
use crate::frequency::FrequencyTable;
use crate::index::Sentence;

// ---------------------------------------------------------------------------
// counts

/// Types and tokens of one sentence collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypesTokens {
    pub types: BTreeSet<String>,
    pub counts: FrequencyTable,
    pub num_types: usize,
    pub num_tokens: u64,
}

pub fn types_tokens(sentences: &[Sentence]) -> TypesTokens {
    let counts = FrequencyTable::from_sentences(sentences);
    TypesTokens {
        types: counts.words().map(str::to_owned).collect(),
        num_types: counts.len(),
        num_tokens: counts.total(),
        counts,
    }
}

/// Types and tokens of parallel collections.
///
/// `avg_types` is the mean per-collection vocabulary size, `total_types` the
/// size of the union. The two differ as soon as annotators use different
/// words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelTypesTokens {
    pub avg_types: f64,
    pub avg_tokens: f64,
    pub total_types: usize,
    pub total_tokens: u64,
    pub separate_counts: Vec<FrequencyTable>,
    pub total_counts: FrequencyTable,
    pub types: BTreeSet<String>,
}

pub fn parallel_types_tokens(parallel: &[Vec<Sentence>]) -> Result<ParallelTypesTokens> {
    if parallel.is_empty() {
        return Err(DiversityError::EmptyInput("parallel collections"));
    }
    let results: Vec<TypesTokens> = parallel.iter().map(|s| types_tokens(s)).collect();
    let n = results.len() as f64;

    let avg_types = results.iter().map(|r| r.num_types).sum::<usize>() as f64 / n;
    let mut total_counts = FrequencyTable::new();
    for r in &results {
        total_counts.merge(&r.counts);
    }
    let total_tokens = total_counts.total();
    let types: BTreeSet<String> = total_counts.words().map(str::to_owned).collect();

    Ok(ParallelTypesTokens {
        avg_types,
        avg_tokens: total_tokens as f64 / n,
        total_types: types.len(),
        total_tokens,
        separate_counts: results.into_iter().map(|r| r.counts).collect(),
        total_counts,
        types,
    })
}

// ---------------------------------------------------------------------------
// sentence length

fn lengths(sentences: &[Sentence]) -> Result<Vec<f64>> {
    if sentences.is_empty() {
        return Err(DiversityError::EmptyInput("sentence collection"));
    }
    Ok(sentences.iter().map(|s| s.len() as f64).collect())
}

pub fn average_sentence_length(sentences: &[Sentence]) -> Result<f64> {
    let lengths = lengths(sentences)?;
    Ok(lengths.iter().sum::<f64>() / lengths.len() as f64)
}

/// Population standard deviation of sentence lengths.
pub fn std_sentence_length(sentences: &[Sentence]) -> Result<f64> {
    let lengths = lengths(sentences)?;
    let n = lengths.len() as f64;
    let mean = lengths.iter().sum::<f64>() / n;
    let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
    Ok(variance.sqrt())
}

// ---------------------------------------------------------------------------
// type-token ratios

fn flatten(sentences: &[Sentence]) -> Vec<&str> {
    sentences
        .iter()
        .flat_map(|s| s.iter().map(String::as_str))
        .collect()
}

/// Mean distinct/window over complete, non-overlapping windows.
fn windowed_ratio<T: Eq + Hash>(items: &[T], window: usize) -> Result<f64> {
    if items.is_empty() {
        return Err(DiversityError::EmptyInput("token stream"));
    }
    let ratios: Vec<f64> = items
        .chunks_exact(window)
        .map(|chunk| chunk.iter().collect::<HashSet<_>>().len() as f64 / window as f64)
        .collect();
    if ratios.is_empty() {
        return Err(DiversityError::NoCompleteWindow {
            window,
            available: items.len(),
        });
    }
    Ok(ratios.iter().sum::<f64>() / ratios.len() as f64)
}

/// Type-token ratio normalized over windows of `window` tokens.
pub fn type_token_ratio(sentences: &[Sentence], window: usize) -> Result<f64> {
    if window == 0 {
        return Err(DiversityError::InvalidConfig("window must be > 0".into()));
    }
    windowed_ratio(&flatten(sentences), window)
}

/// Type-token ratio of overlapping `n`-grams, normalized over `window` n-grams.
///
/// N-grams run across sentence boundaries.
pub fn ngram_ttr(sentences: &[Sentence], n: usize, window: usize) -> Result<f64> {
    if n == 0 || window == 0 {
        return Err(DiversityError::InvalidConfig(
            "n-gram order and window must be > 0".into(),
        ));
    }
    let tokens = flatten(sentences);
    if tokens.is_empty() {
        return Err(DiversityError::EmptyInput("token stream"));
    }
    let grams: Vec<&[&str]> = tokens.windows(n).collect();
    if grams.is_empty() {
        return Err(DiversityError::NoCompleteWindow {
            window,
            available: 0,
        });
    }
    windowed_ratio(&grams, window)
}

pub fn bigram_ttr(sentences: &[Sentence], window: usize) -> Result<f64> {
    ngram_ttr(sentences, 2, window)
}

pub fn trigram_ttr(sentences: &[Sentence], window: usize) -> Result<f64> {
    ngram_ttr(sentences, 3, window)
}

/// Average `metric` over parallel collections.
pub fn average_over<F>(parallel: &[Vec<Sentence>], metric: F) -> Result<f64>
where
    F: Fn(&[Sentence]) -> Result<f64>,
{
    if parallel.is_empty() {
        return Err(DiversityError::EmptyInput("parallel collections"));
    }
    let values = parallel
        .iter()
        .map(|s| metric(s))
        .collect::<Result<Vec<f64>>>()?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// A windowed ratio without complete windows becomes `None`; other errors
/// propagate.
fn undefined_as_none(label: &str, result: Result<f64>) -> Result<Option<f64>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(DiversityError::NoCompleteWindow { window, available }) => {
            warn!("{label} undefined: {available} items, window {window}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// type-token curves

/// Cumulative type counts; element `i` holds the value at token position
/// `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTokenCurve(Vec<f64>);

impl TypeTokenCurve {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at 1-based token `position`.
    pub fn at(&self, position: usize) -> Option<f64> {
        position.checked_sub(1).and_then(|i| self.0.get(i)).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// `(position, types)` pairs for plotting.
    pub fn points(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.0.iter().enumerate().map(|(i, v)| (i + 1, *v))
    }

    /// Drop every position above `n`.
    pub fn cut(&mut self, n: usize) {
        self.0.truncate(n);
    }
}

/// Single pass over the sentences in the given order.
pub fn type_token_curve<S: AsRef<[String]>>(sentences: &[S]) -> TypeTokenCurve {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut curve = Vec::new();
    for word in sentences.iter().flat_map(|s| s.as_ref()) {
        seen.insert(word.as_str());
        curve.push(seen.len() as f64);
    }
    TypeTokenCurve(curve)
}

/// Point-wise mean, truncated to the shortest curve.
pub fn average_curves(curves: &[TypeTokenCurve]) -> Result<TypeTokenCurve> {
    let Some(shared) = curves.iter().map(TypeTokenCurve::len).min() else {
        return Err(DiversityError::EmptyInput("curve list"));
    };
    let n = curves.len() as f64;
    let averaged = (0..shared)
        .map(|i| curves.iter().map(|c| c.0[i]).sum::<f64>() / n)
        .collect();
    Ok(TypeTokenCurve(averaged))
}

/// Average of `repeats` curves, each over a fresh shuffle of sentence order.
pub fn repeated_random_curve<R: Rng + ?Sized>(
    sentences: &[Sentence],
    repeats: usize,
    rng: &mut R,
) -> Result<TypeTokenCurve> {
    if sentences.is_empty() {
        return Err(DiversityError::EmptyInput("sentence collection"));
    }
    if repeats == 0 {
        return Err(DiversityError::InvalidConfig("curve repeats must be > 0".into()));
    }
    let mut order: Vec<&Sentence> = sentences.iter().collect();
    let curves: Vec<TypeTokenCurve> = (0..repeats)
        .map(|_| {
            order.shuffle(rng);
            type_token_curve(&order)
        })
        .collect();
    average_curves(&curves)
}

/// Curve averaged over parallel collections. `repeats = None` walks every
/// collection once in its original order.
pub fn curve_for_parallel<R: Rng + ?Sized>(
    parallel: &[Vec<Sentence>],
    repeats: Option<usize>,
    rng: &mut R,
) -> Result<TypeTokenCurve> {
    let curves = parallel
        .iter()
        .map(|sentences| match repeats {
            Some(k) => repeated_random_curve(sentences, k, rng),
            None => Ok(type_token_curve(sentences)),
        })
        .collect::<Result<Vec<_>>>()?;
    average_curves(&curves)
}

// ---------------------------------------------------------------------------
// records

/// Every statistic of one system's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    #[serde(flatten)]
    pub counts: TypesTokens,
    pub ttr_curve: TypeTokenCurve,
    pub average_sentence_length: f64,
    pub std_sentence_length: f64,
    pub type_token_ratio: Option<f64>,
    pub bittr: Option<f64>,
    pub trittr: Option<f64>,
    pub ttr10k: Option<f64>,
    pub ttr100k: Option<f64>,
}

pub fn system_stats<R: Rng + ?Sized>(
    sentences: &[Sentence],
    config: &StatsConfig,
    rng: &mut R,
) -> Result<SystemStats> {
    config.validate()?;
    debug!("Computing system stats over {} sentences", sentences.len());
    Ok(SystemStats {
        counts: types_tokens(sentences),
        ttr_curve: repeated_random_curve(sentences, config.curve_repeats, rng)?,
        average_sentence_length: average_sentence_length(sentences)?,
        std_sentence_length: std_sentence_length(sentences)?,
        type_token_ratio: undefined_as_none(
            "type_token_ratio",
            type_token_ratio(sentences, config.ttr_window),
        )?,
        bittr: undefined_as_none("bittr", bigram_ttr(sentences, config.ngram_window))?,
        trittr: undefined_as_none("trittr", trigram_ttr(sentences, config.ngram_window))?,
        ttr10k: undefined_as_none("ttr10k", type_token_ratio(sentences, config.ttr10k_window))?,
        ttr100k: undefined_as_none(
            "ttr100k",
            type_token_ratio(sentences, config.ttr100k_window),
        )?,
    })
}

/// Every statistic of a reference corpus, averaged over annotator slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelStats {
    #[serde(flatten)]
    pub counts: ParallelTypesTokens,
    pub ttr_curve: TypeTokenCurve,
    pub average_sentence_length: f64,
    pub std_sentence_length: f64,
    pub type_token_ratio: Option<f64>,
    pub bittr: Option<f64>,
    pub trittr: Option<f64>,
    pub ttr10k: Option<f64>,
    pub ttr100k: Option<f64>,
}

pub fn parallel_stats<R: Rng + ?Sized>(
    parallel: &[Vec<Sentence>],
    config: &StatsConfig,
    rng: &mut R,
) -> Result<ParallelStats> {
    config.validate()?;
    debug!("Computing parallel stats over {} collections", parallel.len());
    let window = |label: &str, w: usize| {
        undefined_as_none(label, average_over(parallel, |s| type_token_ratio(s, w)))
    };
    let ngram = |label: &str, n: usize| {
        undefined_as_none(
            label,
            average_over(parallel, |s| ngram_ttr(s, n, config.ngram_window)),
        )
    };
    Ok(ParallelStats {
        counts: parallel_types_tokens(parallel)?,
        ttr_curve: curve_for_parallel(parallel, Some(config.curve_repeats), rng)?,
        average_sentence_length: average_over(parallel, average_sentence_length)?,
        std_sentence_length: average_over(parallel, std_sentence_length)?,
        type_token_ratio: window("type_token_ratio", config.ttr_window)?,
        bittr: ngram("bittr", 2)?,
        trittr: ngram("trittr", 3)?,
        ttr10k: window("ttr10k", config.ttr10k_window)?,
        ttr100k: window("ttr100k", config.ttr100k_window)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sents(raw: &[&str]) -> Vec<Sentence> {
        raw.iter()
            .map(|s| s.split_whitespace().map(str::to_owned).collect())
            .collect()
    }

    #[test]
    fn counts_types_and_tokens() {
        let tt = types_tokens(&sents(&["a dog runs", "a cat"]));
        assert_eq!(tt.num_types, 4);
        assert_eq!(tt.num_tokens, 5);
        assert_eq!(tt.counts.get("a"), 2);
    }

    #[test]
    fn parallel_counts_distinguish_average_and_union() {
        let parallel = vec![sents(&["a dog"]), sents(&["a cat"])];
        let ptt = parallel_types_tokens(&parallel).unwrap();
        assert_eq!(ptt.avg_types, 2.0);
        assert_eq!(ptt.total_types, 3);
        assert_eq!(ptt.total_tokens, 4);
        assert_eq!(ptt.avg_tokens, 2.0);
        assert_eq!(ptt.separate_counts.len(), 2);
    }

    #[test]
    fn sentence_length_mean_and_population_std() {
        let s = sents(&["a b", "a b c d"]);
        assert_eq!(average_sentence_length(&s).unwrap(), 3.0);
        assert_eq!(std_sentence_length(&s).unwrap(), 1.0);
        assert_eq!(
            average_sentence_length(&[]),
            Err(DiversityError::EmptyInput("sentence collection"))
        );
    }

    #[test]
    fn ttr_discards_incomplete_windows() {
        // windows: [a b] [a a], remainder [c] dropped
        let s = sents(&["a b a", "a c"]);
        let ttr = type_token_ratio(&s, 2).unwrap();
        assert!((ttr - 0.75).abs() < 1e-12);
    }

    #[test]
    fn ttr_without_complete_window_fails() {
        let s = sents(&["a b c"]);
        assert_eq!(
            type_token_ratio(&s, 4),
            Err(DiversityError::NoCompleteWindow {
                window: 4,
                available: 3
            })
        );
        assert_eq!(
            type_token_ratio(&[], 4),
            Err(DiversityError::EmptyInput("token stream"))
        );
    }

    #[test]
    fn bigrams_cross_sentence_boundaries() {
        // tokens a b a b -> bigrams (a b) (b a) (a b)
        let s = sents(&["a b", "a b"]);
        assert!((bigram_ttr(&s, 3).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!(matches!(
            trigram_ttr(&s, 3),
            Err(DiversityError::NoCompleteWindow { .. })
        ));
    }

    #[test]
    fn curve_counts_new_types() {
        let curve = type_token_curve(&sents(&["a b a", "c"]));
        assert_eq!(curve.values(), &[1.0, 2.0, 2.0, 3.0]);
        assert_eq!(curve.at(1), Some(1.0));
        assert_eq!(curve.at(0), None);
    }

    #[test]
    fn average_curves_truncates_to_shared_domain() {
        let a = TypeTokenCurve(vec![1.0, 2.0, 3.0]);
        let b = TypeTokenCurve(vec![1.0, 1.0]);
        assert_eq!(average_curves(&[a, b]).unwrap().values(), &[1.0, 1.5]);
        assert!(average_curves(&[]).is_err());
    }

    #[test]
    fn cut_curve_drops_tail() {
        let mut curve = type_token_curve(&sents(&["a b c d"]));
        curve.cut(2);
        assert_eq!(curve.points().collect::<Vec<_>>(), vec![(1, 1.0), (2, 2.0)]);
    }

    #[test]
    fn random_curve_is_reproducible_under_seed() {
        let s = sents(&["a b", "c a d", "e", "b f g a"]);
        let first = repeated_random_curve(&s, 10, &mut StdRng::seed_from_u64(1234)).unwrap();
        let second = repeated_random_curve(&s, 10, &mut StdRng::seed_from_u64(1234)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
        assert_eq!(first.at(1), Some(1.0));
        assert_eq!(first.at(10), Some(7.0));
    }

    #[test]
    fn parallel_curve_in_original_order() {
        let parallel = vec![sents(&["a b", "a"]), sents(&["a a", "b c"])];
        let mut rng = StdRng::seed_from_u64(0);
        let curve = curve_for_parallel(&parallel, None, &mut rng).unwrap();
        // slot 0: 1 2 2 ; slot 1: 1 1 2 3 ; shared prefix of three
        assert_eq!(curve.values(), &[1.0, 1.5, 2.0]);
    }

    #[test]
    fn system_stats_marks_undefined_windows() {
        let s = sents(&["a dog runs", "a cat sleeps"]);
        let cfg = StatsConfig {
            ttr_window: 3,
            ngram_window: 2,
            ..Default::default()
        };
        let stats = system_stats(&s, &cfg, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(stats.counts.num_tokens, 6);
        assert!(stats.type_token_ratio.is_some());
        assert!(stats.bittr.is_some());
        assert!(stats.ttr10k.is_none());
        assert!(stats.ttr100k.is_none());

        let json = serde_json::to_value(&stats).unwrap();
        assert!(json["ttr10k"].is_null());
        assert_eq!(json["num_types"], 5);
    }

    #[test]
    fn parallel_stats_average_slots() {
        let parallel = vec![sents(&["a b", "c d"]), sents(&["a a", "a a"])];
        let cfg = StatsConfig {
            ttr_window: 2,
            ngram_window: 1,
            curve_repeats: 3,
            ..Default::default()
        };
        let stats = parallel_stats(&parallel, &cfg, &mut StdRng::seed_from_u64(9)).unwrap();
        // slot 0: windows [a b] [c d] -> 1.0 ; slot 1: [a a] [a a] -> 0.5
        assert_eq!(stats.type_token_ratio, Some(0.75));
        assert_eq!(stats.average_sentence_length, 2.0);
        assert_eq!(stats.counts.total_types, 4);
        assert_eq!(stats.ttr_curve.len(), 4);
    }
}
