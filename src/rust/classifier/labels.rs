use std::collections::HashSet;

use super::error::ClassifierError;

/// Display labels of the emotion model, indexed by output class.
pub const EMOTION_LABELS: [&str; 6] = [
    "\u{1f61e}",        // sadness
    "\u{1f60a}",        // joy
    "\u{2764}\u{fe0f}", // love
    "\u{1f621}",        // anger
    "\u{1f631}",        // fear
    "\u{1f632}",        // surprise
];

/// Ordered mapping from class index to display label.
///
/// Indices are the positions `0..len()`, so there are never gaps. Labels are
/// unique and the map is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    pub fn new(labels: Vec<impl Into<String>>) -> Result<Self, ClassifierError> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        if labels.is_empty() {
            return Err(ClassifierError::ValidationError("Label map cannot be empty".into()));
        }
        if let Some(pos) = labels.iter().position(|l| l.is_empty()) {
            return Err(ClassifierError::ValidationError(format!("Label {} cannot be empty", pos)));
        }
        let mut seen = HashSet::new();
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(ClassifierError::ValidationError(format!("Duplicate label '{}'", label)));
            }
        }

        Ok(Self { labels })
    }

    /// The six emotion emojis in model output order.
    pub fn emotions() -> Self {
        Self {
            labels: EMOTION_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::emotions()
    }
}

/// Index of the largest score, first occurrence on ties.
///
/// NaN scores never win; `None` when no score is comparable.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}
