//! Model repositories on the Hugging Face Hub. Every file is downloaded once and then served from
//! the `hf-hub` cache.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use hf_hub::api::sync::{ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use serde::Deserialize;

use crate::{Error, Result};

pub const MODEL_CONFIG_FILE: &str = "config.json";
const SAFETENSORS_INDEX_FILE: &str = "model.safetensors.index.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PYTORCH_FILE: &str = "pytorch_model.bin";

/// The revision and credentials used to reach a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubParams {
    pub revision: String,
    /// Token for private or gated repositories. When unset, the token saved by
    /// `huggingface-cli login` is used, if any.
    pub auth_token: Option<String>,
}

impl Default for HubParams {
    fn default() -> Self {
        Self {
            revision: "main".to_string(),
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightsFormat {
    Safetensors,
    Pytorch,
}

/// Local paths to the weights of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelWeights {
    pub files: Vec<PathBuf>,
    pub format: WeightsFormat,
}

/// A model repository on the Hub.
pub struct HubRepo {
    repo_id: String,
    api: ApiRepo,
}

impl HubRepo {
    /// Connects to the repository `repo_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RepositoryNotFound`] if the repository can't be reached with the given
    /// revision and credentials.
    pub fn open(repo_id: &str, params: Option<HubParams>) -> Result<Self> {
        let params = params.unwrap_or_default();
        let mut builder = ApiBuilder::new().with_progress(false);
        if params.auth_token.is_some() {
            builder = builder.with_token(params.auth_token);
        }
        let api = builder
            .build()
            .map_err(|e| Error::ModelLoad(format!("cannot create the Hub client: {e}")))?
            .repo(Repo::with_revision(
                repo_id.to_string(),
                RepoType::Model,
                params.revision,
            ));

        if api.info().is_err() && api.get(MODEL_CONFIG_FILE).is_err() {
            return Err(Error::RepositoryNotFound(repo_id.to_string()));
        }

        Ok(Self {
            repo_id: repo_id.to_string(),
            api,
        })
    }

    pub fn id(&self) -> &str {
        &self.repo_id
    }

    /// Gets the local path of `file`, or `None` if the repository doesn't have it.
    pub fn get_file(&self, file: &str) -> Option<PathBuf> {
        self.api.get(file).ok()
    }

    /// Reads the model configuration from `config.json`.
    pub fn model_config(&self) -> Result<serde_json::Value> {
        let path = self
            .get_file(MODEL_CONFIG_FILE)
            .ok_or(Error::MissingModelConfig)?;
        read_model_config(&path)
    }

    /// Resolves the model weights. Sharded safetensors listed in the index come first, then a
    /// single safetensors file, then a PyTorch checkpoint.
    pub fn model_weights(&self) -> Result<ModelWeights> {
        if let Some(index_path) = self.get_file(SAFETENSORS_INDEX_FILE) {
            let index = fs::read_to_string(&index_path)
                .map_err(|e| Error::ModelLoad(format!("cannot read `{SAFETENSORS_INDEX_FILE}`: {e}")))?;
            let files = shard_files(&index)?
                .iter()
                .map(|shard| {
                    self.api
                        .get(shard)
                        .map_err(|e| Error::ModelLoad(format!("cannot download `{shard}`: {e}")))
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(ModelWeights {
                files,
                format: WeightsFormat::Safetensors,
            });
        }

        let single_file = [
            (SAFETENSORS_FILE, WeightsFormat::Safetensors),
            (PYTORCH_FILE, WeightsFormat::Pytorch),
        ]
        .into_iter()
        .find_map(|(file, format)| self.get_file(file).map(|path| (path, format)));

        match single_file {
            Some((path, format)) => Ok(ModelWeights {
                files: vec![path],
                format,
            }),
            None => Err(Error::ModelWeightsNotFound),
        }
    }
}

/// Reads a `config.json` file. A file that can't be read or isn't valid JSON makes the model
/// impossible to load.
pub fn read_model_config(path: &Path) -> Result<serde_json::Value> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::ModelLoad(format!("cannot read `{}`: {e}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|e| Error::ModelLoad(format!("invalid `{}`: {e}", path.display())))
}

#[derive(Deserialize)]
struct SafetensorsIndex {
    weight_map: HashMap<String, String>,
}

/// Lists the distinct shards of a `model.safetensors.index.json`, sorted by name.
fn shard_files(index: &str) -> Result<Vec<String>> {
    let index: SafetensorsIndex = serde_json::from_str(index)
        .map_err(|e| Error::ModelLoad(format!("invalid `{SAFETENSORS_INDEX_FILE}`: {e}")))?;
    Ok(index
        .weight_map
        .into_values()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp_file(dir_name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(dir_name);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(MODEL_CONFIG_FILE);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_params_use_main_revision() {
        let params = HubParams::default();
        assert_eq!(params.revision, "main");
        assert!(params.auth_token.is_none());
    }

    #[test]
    fn test_read_model_config() {
        let path = write_temp_file(
            "emotion-classifier-read-config",
            r#"{"model_type": "bert", "hidden_size": 8}"#,
        );
        let config = read_model_config(&path).unwrap();
        assert_eq!(config["model_type"], "bert");
        assert_eq!(config["hidden_size"], 8);
    }

    #[test]
    fn test_invalid_model_config_is_a_model_load_error() {
        let path = write_temp_file("emotion-classifier-invalid-config", "{\"model_type\": ");
        let err = read_model_config(&path).unwrap_err();
        assert!(err.is_model_load());
        assert!(matches!(err, Error::ModelLoad(_)));
    }

    #[test]
    fn test_missing_model_config_file_is_a_model_load_error() {
        let path = std::env::temp_dir()
            .join("emotion-classifier-no-such-dir")
            .join(MODEL_CONFIG_FILE);
        assert!(matches!(read_model_config(&path), Err(Error::ModelLoad(_))));
    }

    #[test]
    fn test_shard_files_are_unique_and_sorted() {
        let files = shard_files(
            r#"{
                "metadata": {"total_size": 1024},
                "weight_map": {
                    "bert.encoder.layer.0.output.dense.weight": "model-00002-of-00002.safetensors",
                    "bert.embeddings.word_embeddings.weight": "model-00001-of-00002.safetensors",
                    "classifier.weight": "model-00002-of-00002.safetensors"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            files,
            vec![
                "model-00001-of-00002.safetensors".to_string(),
                "model-00002-of-00002.safetensors".to_string(),
            ]
        );
    }

    #[test]
    fn test_invalid_safetensors_index() {
        assert!(matches!(shard_files("[]"), Err(Error::ModelLoad(_))));
    }
}
