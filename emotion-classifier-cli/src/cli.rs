use candle_core::DType;
use clap::Parser;
use emotion_classifier::{DeviceOption, HubParams};
use emotion_classifier_pipelines::{PredictorOptions, DEFAULT_EMOTION_MODEL, DEFAULT_MAX_LENGTH};
use std::str::FromStr;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// The text to classify.
    #[arg(default_value = "I'm feeling lonely today.")]
    text: String,

    /// The Hugging Face repository id of the model to be loaded.
    #[arg(short, long, default_value = DEFAULT_EMOTION_MODEL)]
    model: String,

    /// The device to run the model on: `auto`, `cpu`, `metal` or `cuda:<id>`.
    #[arg(short, long, value_parser = parse_device, default_value = "auto")]
    device: DeviceOption,

    /// The dtype to load the model weights with.
    #[arg(long)]
    dtype: Option<DTypeOption>,

    /// The revision of the model repository.
    #[arg(long, default_value = "main")]
    revision: String,

    /// The token used to access private or gated repositories.
    #[arg(long)]
    auth_token: Option<String>,

    /// The maximum number of tokens of the text, special tokens included.
    #[arg(long, default_value_t = DEFAULT_MAX_LENGTH)]
    max_length: usize,

    /// Print the score of every emotion instead of only the dominant one.
    #[arg(long)]
    all: bool,

    /// Enable debug logs.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn all(&self) -> bool {
        self.all
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Get the [`candle_core::DType`] corresponding to the selected dtype option.
    pub fn dtype(&self) -> Option<DType> {
        self.dtype.as_ref().map(|dtype| match dtype {
            DTypeOption::Float16 => DType::F16,
            DTypeOption::BFloat16 => DType::BF16,
            DTypeOption::Float32 => DType::F32,
        })
    }

    /// Get the options used to load the predictor.
    pub fn predictor_options(&self) -> PredictorOptions {
        PredictorOptions {
            device: self.device,
            dtype: self.dtype(),
            max_length: self.max_length,
            params: Some(HubParams {
                revision: self.revision.clone(),
                auth_token: self.auth_token.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, clap::ValueEnum)]
#[clap(rename_all = "lowercase")]
pub(crate) enum DTypeOption {
    Float16,
    BFloat16,
    Float32,
}

fn parse_device(s: &str) -> emotion_classifier::Result<DeviceOption> {
    DeviceOption::from_str(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["classify-emotion"]).unwrap();
        assert_eq!(cli.text(), "I'm feeling lonely today.");
        assert_eq!(cli.model(), "sajeewa/emotion-classification-bert");
        assert!(!cli.all());
        assert!(!cli.verbose());

        let options = cli.predictor_options();
        assert_eq!(options.device, DeviceOption::Auto);
        assert_eq!(options.dtype, None);
        assert_eq!(options.max_length, 50);
        let params = options.params.unwrap();
        assert_eq!(params.revision, "main");
        assert_eq!(params.auth_token, None);
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "classify-emotion",
            "What a wonderful surprise!",
            "--model",
            "my-org/my-emotion-model",
            "--device",
            "cuda:1",
            "--dtype",
            "bfloat16",
            "--revision",
            "v2",
            "--auth-token",
            "hf_token",
            "--max-length",
            "32",
            "--all",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.text(), "What a wonderful surprise!");
        assert_eq!(cli.model(), "my-org/my-emotion-model");
        assert!(cli.all());
        assert!(cli.verbose());

        let options = cli.predictor_options();
        assert_eq!(options.device, DeviceOption::Cuda(1));
        assert_eq!(options.dtype, Some(DType::BF16));
        assert_eq!(options.max_length, 32);
        let params = options.params.unwrap();
        assert_eq!(params.revision, "v2");
        assert_eq!(params.auth_token.as_deref(), Some("hf_token"));
    }

    #[test]
    fn test_invalid_device_is_rejected() {
        assert!(Cli::try_parse_from(["classify-emotion", "--device", "tpu"]).is_err());
    }
}
