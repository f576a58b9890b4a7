use candle_core::{DType, Device, Tensor};
use candle_nn::ops::sigmoid;
use emotion_classifier::{ClassifierInputs, DeviceOption, Error, HubParams, HubRepo, Result};
use emotion_classifier_models::{BertForSequenceClassification, PreTrainedModel, ProblemType};
use emotion_classifier_tokenizers::{BertTokenizer, Tokenizer};

use crate::scores::{round_score, EmotionScores};

/// The emotions predicted by the default model, in the order of its output dimensions.
pub const EMOTION_LABELS: [&str; 8] = [
    "anger",
    "fear",
    "disgust",
    "sadness",
    "surprise",
    "joy",
    "anticipation",
    "trust",
];

pub const DEFAULT_EMOTION_MODEL: &str = "sajeewa/emotion-classification-bert";

/// Maximum number of tokens, special tokens included, fed to the model.
pub const DEFAULT_MAX_LENGTH: usize = 50;

/// Options used to load an [`EmotionPredictor`].
#[derive(Debug, Clone)]
pub struct PredictorOptions {
    /// The device on which the model will run.
    pub device: DeviceOption,
    /// The numeric type of the model weights. `None` uses the default of the model.
    pub dtype: Option<DType>,
    /// Sequences longer than this number of tokens get truncated.
    pub max_length: usize,
    /// Revision and auth token used to reach the Hugging Face Hub.
    pub params: Option<HubParams>,
}

impl Default for PredictorOptions {
    fn default() -> Self {
        Self {
            device: DeviceOption::Auto,
            dtype: None,
            max_length: DEFAULT_MAX_LENGTH,
            params: Some(HubParams::default()),
        }
    }
}

/// Predicts the probability of a fixed set of emotions for a text, using a BERT model with a
/// multi-label classification head.
///
/// The tokenizer, the model and the device are loaded once and never mutated afterwards, so the
/// predictor can be shared between threads behind an `Arc`.
pub struct EmotionPredictor {
    tokenizer: Box<dyn Tokenizer>,
    model: Box<dyn PreTrainedModel>,
    labels: Vec<String>,
    device: Device,
}

impl EmotionPredictor {
    /// Creates a new `EmotionPredictor` loading the tokenizer and the model from the Hugging Face
    /// Hub.
    ///
    /// # Arguments
    ///
    /// * `identifier` - The repository id of the model to load.
    /// * `labels` - The labels of the model outputs, in order.
    /// * `options` - Device, dtype, truncation length and Hub parameters.
    ///
    /// # Returns
    ///
    /// The `EmotionPredictor` instance.
    ///
    /// # Errors
    ///
    /// Any failure while resolving, downloading or instantiating the tokenizer and the model is
    /// reported as a model load error (see [`Error::is_model_load`]), including a model whose
    /// number of outputs doesn't match the number of `labels`.
    pub fn new<S: AsRef<str>, L: AsRef<str>>(
        identifier: S,
        labels: &[L],
        options: PredictorOptions,
    ) -> Result<Self> {
        ensure_labels(labels)?;
        let identifier = identifier.as_ref();
        let device = options.device.device()?;
        tracing::info!(
            "Loading emotion classifier '{}' on device '{}'",
            identifier,
            options.device
        );

        let (tokenizer, model) = load_parts(identifier, labels.len(), &device, &options)
            .map_err(Error::into_model_load)?;
        tracing::info!(
            "Loaded emotion classifier '{}' with {} labels",
            identifier,
            labels.len()
        );

        Self::from_parts(Box::new(tokenizer), Box::new(model), labels, device)
    }

    /// Creates a new `EmotionPredictor` from an already loaded tokenizer and model. The tokenizer
    /// is used as is, so it should already have truncation and padding configured.
    pub fn from_parts<L: AsRef<str>>(
        tokenizer: Box<dyn Tokenizer>,
        model: Box<dyn PreTrainedModel>,
        labels: &[L],
        device: Device,
    ) -> Result<Self> {
        ensure_labels(labels)?;
        match model.config().problem_type() {
            Some(ProblemType::MultiLabelClassification) | None => {}
            Some(problem_type) => tracing::warn!(
                "The model was trained for {:?}, its scores are read as independent probabilities",
                problem_type
            ),
        }
        let found = model.config().num_labels();
        if found != labels.len() {
            return Err(Error::LabelCountMismatch {
                expected: labels.len(),
                found,
            });
        }
        Ok(Self {
            tokenizer,
            model,
            labels: labels.iter().map(|l| l.as_ref().to_string()).collect(),
            device,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    fn preprocess(&self, text: &str) -> Result<ClassifierInputs> {
        self.tokenizer.encode(&[text])?.to_device(&self.device)
    }

    fn postprocess(&self, logits: &Tensor) -> Result<EmotionScores> {
        let probabilities = sigmoid(logits)
            .and_then(|probabilities| probabilities.to_dtype(DType::F32))
            .and_then(|probabilities| probabilities.to_vec2::<f32>())
            .map_err(|e| Error::Inference(e.to_string()))?;
        let probabilities = probabilities
            .into_iter()
            .next()
            .ok_or_else(|| Error::Inference("the model returned an empty batch".to_string()))?;
        if probabilities.len() != self.labels.len() {
            return Err(Error::Inference(format!(
                "the model returned {} scores for {} labels",
                probabilities.len(),
                self.labels.len()
            )));
        }

        Ok(EmotionScores::new(
            self.labels
                .iter()
                .cloned()
                .zip(probabilities.into_iter().map(round_score))
                .collect(),
        ))
    }

    /// Classifies a single text.
    ///
    /// # Arguments
    ///
    /// * `text` - The text to classify.
    ///
    /// # Returns
    ///
    /// The probability of every label, rounded to 4 decimal places.
    pub fn classify<S: AsRef<str>>(&self, text: S) -> Result<EmotionScores> {
        let inputs = self.preprocess(text.as_ref())?;
        let logits = self.model.forward(&inputs)?;
        let scores = self.postprocess(&logits)?;
        tracing::debug!("Emotion scores: {:?}", scores);
        Ok(scores)
    }
}

fn load_parts(
    identifier: &str,
    num_labels: usize,
    device: &Device,
    options: &PredictorOptions,
) -> Result<(BertTokenizer, BertForSequenceClassification)> {
    let repo = HubRepo::open(identifier, options.params.clone())?;

    let mut tokenizer = BertTokenizer::from_repo(&repo)?;
    tokenizer.set_truncation(options.max_length)?;
    tokenizer.enable_padding()?;

    let model =
        BertForSequenceClassification::from_repo(&repo, device, options.dtype, Some(num_labels))?;
    Ok((tokenizer, model))
}

fn ensure_labels<L: AsRef<str>>(labels: &[L]) -> Result<()> {
    if labels.is_empty() {
        return Err(Error::ModelLoad(
            "at least one label is required to classify".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_predictor_is_send_and_sync() {
        assert_send_sync::<EmotionPredictor>();
    }

    #[test]
    fn test_default_options() {
        let options = PredictorOptions::default();
        assert_eq!(options.device, DeviceOption::Auto);
        assert_eq!(options.dtype, None);
        assert_eq!(options.max_length, 50);
        assert_eq!(options.params.map(|p| p.revision), Some("main".to_string()));
    }

    #[test]
    fn test_empty_labels_are_rejected() {
        let labels: [&str; 0] = [];
        let result = EmotionPredictor::new(DEFAULT_EMOTION_MODEL, &labels, Default::default());
        assert!(matches!(result, Err(Error::ModelLoad(_))));
    }
}
