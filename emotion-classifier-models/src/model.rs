use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use emotion_classifier::{
    ClassifierInputs, Error, HubParams, HubRepo, ModelWeights, Result, WeightsFormat,
};

use crate::config::{set_num_labels, PretrainedConfig};

/// Trait for a pre-trained model. Implementors are immutable once loaded, so a single instance
/// can be shared between threads.
pub trait PreTrainedModel: Send + Sync {
    fn load(vb: VarBuilder, config: serde_json::Value) -> Result<Self>
    where
        Self: Sized;

    /// Type of the parameters when the caller doesn't choose one.
    fn default_dtype() -> DType
    where
        Self: Sized;

    fn config(&self) -> &PretrainedConfig;

    /// Runs a forward pass in inference mode and returns the logits.
    fn forward(&self, inputs: &ClassifierInputs) -> Result<Tensor>;

    /// Loads the model stored in `repo`. When `num_labels` is given, the classification head is
    /// built with that many outputs and the repository configuration must agree with it.
    fn from_repo(
        repo: &HubRepo,
        device: &Device,
        dtype: Option<DType>,
        num_labels: Option<usize>,
    ) -> Result<Self>
    where
        Self: Sized,
    {
        let mut config = repo.model_config()?;
        if let Some(num_labels) = num_labels {
            set_num_labels(&mut config, num_labels)?;
        }
        let weights = repo.model_weights()?;
        tracing::debug!(
            "Loading '{}' from {} {:?} file(s)",
            repo.id(),
            weights.files.len(),
            weights.format
        );
        let vb = var_builder(&weights, dtype.unwrap_or_else(Self::default_dtype), device)?;
        Self::load(vb, config)
    }

    fn from_pretrained(
        repo_id: &str,
        device: &Device,
        dtype: Option<DType>,
        num_labels: Option<usize>,
        params: Option<HubParams>,
    ) -> Result<Self>
    where
        Self: Sized,
    {
        Self::from_repo(&HubRepo::open(repo_id, params)?, device, dtype, num_labels)
    }
}

/// Maps the weight files into a `VarBuilder`.
pub fn var_builder(
    weights: &ModelWeights,
    dtype: DType,
    device: &Device,
) -> Result<VarBuilder<'static>> {
    let vb = match weights.format {
        WeightsFormat::Pytorch => {
            let file = weights.files.first().ok_or(Error::ModelWeightsNotFound)?;
            VarBuilder::from_pth(file, dtype, device)
        }
        // SAFETY: the files are owned by the hub cache and are not modified while mapped.
        WeightsFormat::Safetensors => unsafe {
            VarBuilder::from_mmaped_safetensors(&weights.files, dtype, device)
        },
    };
    vb.map_err(|e| Error::ModelLoad(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_safetensors_file_fails_to_map() {
        let weights = ModelWeights {
            files: vec![std::env::temp_dir()
                .join("emotion-classifier-no-weights")
                .join("model.safetensors")],
            format: WeightsFormat::Safetensors,
        };
        assert!(matches!(
            var_builder(&weights, DType::F32, &Device::Cpu),
            Err(Error::ModelLoad(_))
        ));
    }

    #[test]
    fn test_pytorch_weights_without_files() {
        let weights = ModelWeights {
            files: vec![],
            format: WeightsFormat::Pytorch,
        };
        assert!(matches!(
            var_builder(&weights, DType::F32, &Device::Cpu),
            Err(Error::ModelWeightsNotFound)
        ));
    }
}
