use serde::ser::{Serialize, SerializeMap, Serializer};

/// Number of decimal places kept for every score.
const SCORE_DECIMALS: i32 = 4;

/// Rounds a probability to [`SCORE_DECIMALS`] decimal places.
pub(crate) fn round_score(score: f32) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    (f64::from(score) * factor).round() / factor
}

/// The probability of every label for a single text, kept in label order.
///
/// Scores are independent sigmoid outputs, so they don't need to sum to `1` and more than one
/// label can be close to `1` at the same time. Serializes as a JSON object preserving the label
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmotionScores {
    scores: Vec<(String, f64)>,
}

impl EmotionScores {
    pub fn new(scores: Vec<(String, f64)>) -> Self {
        Self { scores }
    }

    /// Gets the score of `label`, if present.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, score)| *score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores
            .iter()
            .map(|(label, score)| (label.as_str(), *score))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.scores.iter().map(|(label, _)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Gets the label with the highest score. When several labels share the highest score, the
    /// one that comes first in label order is returned.
    ///
    /// # Returns
    ///
    /// The dominant `(label, score)` pair or `None` if there are no scores.
    pub fn dominant(&self) -> Option<(&str, f64)> {
        self.iter().fold(None, |best, (label, score)| match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((label, score)),
        })
    }

    /// Same as [`EmotionScores::dominant`] but as a single-entry `EmotionScores`.
    pub fn to_dominant(&self) -> EmotionScores {
        Self::new(
            self.dominant()
                .map(|(label, score)| (label.to_string(), score))
                .into_iter()
                .collect(),
        )
    }

    /// Gets every label whose score is strictly greater than `threshold`, in label order.
    pub fn above(&self, threshold: f64) -> Vec<(&str, f64)> {
        self.iter().filter(|(_, score)| *score > threshold).collect()
    }
}

impl Serialize for EmotionScores {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.scores.len()))?;
        for (label, score) in &self.scores {
            map.serialize_entry(label, score)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a EmotionScores {
    type Item = &'a (String, f64);
    type IntoIter = std::slice::Iter<'a, (String, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.scores.iter()
    }
}
