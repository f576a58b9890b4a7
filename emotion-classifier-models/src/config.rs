use emotion_classifier::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Number of labels a classification head has when the configuration doesn't say otherwise.
const DEFAULT_NUM_LABELS: usize = 2;

/// The type of problem the model was trained on.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    Regression,
    SingleLabelClassification,
    MultiLabelClassification,
}

/// The task-level part of a `config.json`, shared by every architecture.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PretrainedConfig {
    #[serde(default)]
    problem_type: Option<ProblemType>,
    #[serde(default, deserialize_with = "deserialize_id2label")]
    id2label: Option<HashMap<usize, String>>,
    /// Explicit number of labels, takes precedence over `id2label`.
    #[serde(default)]
    num_labels: Option<usize>,
}

impl PretrainedConfig {
    pub fn problem_type(&self) -> Option<ProblemType> {
        self.problem_type
    }

    /// Gets the number of labels the model was trained on.
    pub fn num_labels(&self) -> usize {
        match (self.num_labels, &self.id2label) {
            (Some(num_labels), _) => num_labels,
            (None, Some(id2label)) if !id2label.is_empty() => id2label.len(),
            _ => DEFAULT_NUM_LABELS,
        }
    }
}

fn deserialize_id2label<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<HashMap<usize, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let map: Option<HashMap<String, String>> = Deserialize::deserialize(deserializer)?;
    map.map(|m| {
        m.into_iter()
            .map(|(k, v)| {
                k.parse::<usize>()
                    .map(|id| (id, v))
                    .map_err(serde::de::Error::custom)
            })
            .collect::<std::result::Result<HashMap<usize, String>, D::Error>>()
    })
    .transpose()
}

/// Forces the number of labels of a raw `config.json` value, the same way `num_labels` does when
/// loading a model with `transformers`.
///
/// # Errors
///
/// Returns [`Error::LabelCountMismatch`] if the configuration already declares a different
/// number of labels through `id2label`.
pub fn set_num_labels(config: &mut serde_json::Value, num_labels: usize) -> Result<()> {
    let config_map = config
        .as_object_mut()
        .ok_or_else(|| Error::ModelLoad("`config.json` is not a JSON object".to_string()))?;

    if let Some(found) = config_map
        .get("id2label")
        .and_then(|id2label| id2label.as_object())
        .map(|id2label| id2label.len())
    {
        if found != num_labels {
            return Err(Error::LabelCountMismatch {
                expected: num_labels,
                found,
            });
        }
    }

    config_map.insert("num_labels".to_string(), num_labels.into());
    Ok(())
}
