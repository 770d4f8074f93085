//! Annotated captions as produced by the external tokenizer / tagger.

use serde::{Deserialize, Serialize};

/// MS COCO style image identifier.
pub type ImageId = u64;

/// One `(word, tag)` pair, stored as a two-element JSON array.
///
/// A missing or `null` tag reads as the empty tag, which no content-word
/// filter accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Option<String>>")]
pub struct TaggedToken(pub String, pub String);

impl TryFrom<Vec<Option<String>>> for TaggedToken {
    type Error = &'static str;

    fn try_from(pair: Vec<Option<String>>) -> std::result::Result<Self, Self::Error> {
        let mut parts = pair.into_iter();
        let word = parts.next().flatten().ok_or("tagged token without a word")?;
        let tag = parts.next().flatten().unwrap_or_default();
        Ok(Self(word, tag))
    }
}

impl TaggedToken {
    pub fn new(word: impl Into<String>, tag: impl Into<String>) -> Self {
        Self(word.into(), tag.into())
    }

    pub fn word(&self) -> &str {
        &self.0
    }

    pub fn tag(&self) -> &str {
        &self.1
    }
}

/// A single description of a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub image_id: ImageId,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub tokenized: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagged: Option<Vec<TaggedToken>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compounds: Option<Vec<Vec<String>>>,
}

impl Annotation {
    pub fn new(image_id: ImageId, tokens: &[&str]) -> Self {
        Self {
            image_id,
            caption: tokens.join(" "),
            tokenized: tokens.iter().map(|t| (*t).to_owned()).collect(),
            tagged: None,
            compounds: None,
        }
    }

    pub fn tagged(image_id: ImageId, pairs: &[(&str, &str)]) -> Self {
        let words: Vec<&str> = pairs.iter().map(|(w, _)| *w).collect();
        let mut annotation = Self::new(image_id, &words);
        annotation.tagged = Some(
            pairs
                .iter()
                .map(|(w, t)| TaggedToken::new(*w, *t))
                .collect(),
        );
        annotation
    }
}

/// Reference corpus file: `{"annotations": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationFile {
    pub annotations: Vec<Annotation>,
}

pub fn captions(annotations: &[Annotation]) -> Vec<&str> {
    annotations.iter().map(|a| a.caption.as_str()).collect()
}

/// Tokenized sentences in file order, optionally lowercased.
pub fn sentences(annotations: &[Annotation], lower: bool) -> Vec<Vec<String>> {
    annotations
        .iter()
        .map(|a| lower_tokens(&a.tokenized, lower))
        .collect()
}

pub(crate) fn lower_tokens(tokens: &[String], lower: bool) -> Vec<String> {
    if lower {
        tokens.iter().map(|t| t.to_lowercase()).collect()
    } else {
        tokens.to_vec()
    }
}

pub(crate) fn lower_tagged(tokens: &[TaggedToken], lower: bool) -> Vec<TaggedToken> {
    tokens
        .iter()
        .map(|t| {
            let word = if lower { t.0.to_lowercase() } else { t.0.clone() };
            TaggedToken(word, t.1.clone())
        })
        .collect()
}
