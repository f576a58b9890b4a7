pub mod emotion;
pub mod scores;

pub use emotion::{
    EmotionPredictor, PredictorOptions, DEFAULT_EMOTION_MODEL, DEFAULT_MAX_LENGTH, EMOTION_LABELS,
};
pub use scores::EmotionScores;
