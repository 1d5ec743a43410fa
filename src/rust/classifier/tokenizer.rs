use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;
use tokenizers::Tokenizer;

use super::error::ClassifierError;

/// Converts raw text into the integer ids the classifier was trained on.
///
/// Implementations are loaded once and only read afterwards, so they must be
/// shareable across request tasks.
pub trait TextEncoder: Send + Sync + fmt::Debug {
    /// Maps text to one id per token, in order. Unknown tokens never raise.
    fn encode(&self, text: &str) -> Result<Vec<i64>, ClassifierError>;

    /// Number of entries in the vocabulary
    fn vocab_size(&self) -> usize;

    /// Short name of the artifact format, used in logs
    fn kind(&self) -> &'static str;
}

const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

fn default_filters() -> String {
    DEFAULT_FILTERS.to_string()
}

fn default_split() -> String {
    " ".to_string()
}

fn default_lower() -> bool {
    true
}

/// `word_index` is stored as a JSON-encoded string by `Tokenizer.to_json()`
/// and as a plain object by hand-written exports.
#[derive(Deserialize)]
#[serde(untagged)]
enum WordIndexField {
    Encoded(String),
    Map(HashMap<String, i64>),
}

impl WordIndexField {
    fn into_map(self) -> Result<HashMap<String, i64>, ClassifierError> {
        match self {
            Self::Map(map) => Ok(map),
            Self::Encoded(raw) => serde_json::from_str(&raw)
                .map_err(|e| ClassifierError::TokenizerError(format!("Invalid word_index: {}", e))),
        }
    }
}

#[derive(Deserialize)]
struct KerasTokenizerConfig {
    #[serde(default)]
    num_words: Option<usize>,
    #[serde(default = "default_filters")]
    filters: String,
    #[serde(default = "default_lower")]
    lower: bool,
    #[serde(default = "default_split")]
    split: String,
    #[serde(default)]
    char_level: bool,
    #[serde(default)]
    oov_token: Option<String>,
    word_index: WordIndexField,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KerasTokenizerJson {
    Wrapped { config: KerasTokenizerConfig },
    Bare(KerasTokenizerConfig),
}

/// Word-level tokenizer reproducing the Keras `Tokenizer.texts_to_sequences` rules.
///
/// Splitting, case folding and OOV handling come from the exported artifact
/// rather than from constants, so the vocabulary and the splitting scheme can
/// never disagree.
#[derive(Debug, Clone)]
pub struct KerasTokenizer {
    word_index: HashMap<String, i64>,
    num_words: Option<usize>,
    filters: Vec<char>,
    lower: bool,
    split: String,
    char_level: bool,
    oov_index: Option<i64>,
}

impl KerasTokenizer {
    /// Parses the output of Keras `Tokenizer.to_json()` (or its bare `config` object).
    pub fn from_json_str(json: &str) -> Result<Self, ClassifierError> {
        let parsed: KerasTokenizerJson = serde_json::from_str(json)
            .map_err(|e| ClassifierError::TokenizerError(format!("Invalid Keras tokenizer JSON: {}", e)))?;
        let config = match parsed {
            KerasTokenizerJson::Wrapped { config } => config,
            KerasTokenizerJson::Bare(config) => config,
        };

        if config.split.is_empty() && !config.char_level {
            return Err(ClassifierError::TokenizerError("Tokenizer split separator cannot be empty".into()));
        }

        let word_index = config.word_index.into_map()?;
        let oov_index = match &config.oov_token {
            Some(token) => Some(*word_index.get(token).ok_or_else(|| {
                ClassifierError::TokenizerError(format!("OOV token '{}' is missing from word_index", token))
            })?),
            None => None,
        };

        Ok(Self {
            word_index,
            num_words: config.num_words,
            filters: config.filters.chars().collect(),
            lower: config.lower,
            split: config.split,
            char_level: config.char_level,
            oov_index,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let raw = fs::read_to_string(path.as_ref())
            .map_err(|e| ClassifierError::TokenizerError(format!("Failed to read {:?}: {}", path.as_ref(), e)))?;
        Self::from_json_str(&raw)
    }

    pub fn oov_index(&self) -> Option<i64> {
        self.oov_index
    }

    /// Splits text into the pieces that are looked up in the vocabulary.
    pub fn split_words(&self, text: &str) -> Vec<String> {
        let text = if self.lower { text.to_lowercase() } else { text.to_string() };

        if self.char_level {
            return text.chars().map(String::from).collect();
        }

        let mut replaced = String::with_capacity(text.len());
        for c in text.chars() {
            if self.filters.contains(&c) {
                replaced.push_str(&self.split);
            } else {
                replaced.push(c);
            }
        }

        replaced
            .split(self.split.as_str())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn lookup(&self, word: &str) -> Option<i64> {
        match self.word_index.get(word) {
            Some(&id) => match self.num_words {
                Some(limit) if limit > 0 && id >= limit as i64 => self.oov_index,
                _ => Some(id),
            },
            None => self.oov_index,
        }
    }
}

impl TextEncoder for KerasTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<i64>, ClassifierError> {
        Ok(self
            .split_words(text)
            .iter()
            .filter_map(|w| self.lookup(w))
            .collect())
    }

    fn vocab_size(&self) -> usize {
        self.word_index.len()
    }

    fn kind(&self) -> &'static str {
        "keras"
    }
}

/// A Hugging Face `tokenizer.json`, for models exported with a subword vocabulary.
#[derive(Debug)]
pub struct HfTokenizer {
    tokenizer: Tokenizer,
}

impl HfTokenizer {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let tokenizer = Tokenizer::from_file(path.as_ref())
            .map_err(|e| ClassifierError::TokenizerError(format!("Failed to load tokenizer: {}", e)))?;
        Ok(Self { tokenizer })
    }
}

impl TextEncoder for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<i64>, ClassifierError> {
        let encoding = self.tokenizer.encode(text, false)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        Ok(encoding.get_ids().iter().map(|&id| i64::from(id)).collect())
    }

    fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    fn kind(&self) -> &'static str {
        "huggingface"
    }
}

/// Loads the tokenizer artifact, picking the format from the file's content.
///
/// Keras exports are recognised by their `word_index`; anything else is
/// handed to the Hugging Face loader.
pub fn load_encoder<P: AsRef<Path>>(path: P) -> Result<Box<dyn TextEncoder>, ClassifierError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|e| ClassifierError::TokenizerError(format!("Failed to read {:?}: {}", path, e)))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| ClassifierError::TokenizerError(format!("Tokenizer file is not valid JSON: {}", e)))?;

    let is_keras = value.get("word_index").is_some()
        || value.get("config").and_then(|c| c.get("word_index")).is_some();

    let encoder: Box<dyn TextEncoder> = if is_keras {
        Box::new(KerasTokenizer::from_json_str(&raw)?)
    } else {
        Box::new(HfTokenizer::from_file(path)?)
    };

    info!("Loaded {} tokenizer with {} entries from {:?}", encoder.kind(), encoder.vocab_size(), path);
    Ok(encoder)
}
