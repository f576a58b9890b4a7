use emotion_classifier::{Error, Result};
use serde::Deserialize;

use crate::config::PretrainedConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HiddenAct {
    #[default]
    Gelu,
    GeluNew,
    Relu,
}

fn default_dropout_prob() -> f32 {
    0.1
}

fn default_type_vocab_size() -> usize {
    2
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}

/// Architecture of a BERT encoder, read from `config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BertConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub max_position_embeddings: usize,
    #[serde(default)]
    pub hidden_act: HiddenAct,
    #[serde(default = "default_dropout_prob")]
    pub hidden_dropout_prob: f32,
    #[serde(default = "default_dropout_prob")]
    pub attention_probs_dropout_prob: f32,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    pub classifier_dropout: Option<f32>,

    #[serde(flatten, default)]
    pub pretrained_config: PretrainedConfig,
}

impl BertConfig {
    /// Checks the hidden size can be split evenly between the attention heads.
    pub fn validate(&self) -> Result<()> {
        if self.num_attention_heads == 0 {
            return Err(Error::ModelLoad(
                "the number of attention heads must be positive".to_string(),
            ));
        }
        if self.hidden_size % self.num_attention_heads != 0 {
            return Err(Error::ModelLoad(format!(
                "hidden size {} is not a multiple of the number of attention heads {}",
                self.hidden_size, self.num_attention_heads
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bert_base_config() -> serde_json::Value {
        json!({
            "architectures": ["BertForSequenceClassification"],
            "attention_probs_dropout_prob": 0.1,
            "classifier_dropout": null,
            "hidden_act": "gelu",
            "hidden_dropout_prob": 0.1,
            "hidden_size": 768,
            "id2label": {
                "0": "LABEL_0", "1": "LABEL_1", "2": "LABEL_2", "3": "LABEL_3",
                "4": "LABEL_4", "5": "LABEL_5", "6": "LABEL_6", "7": "LABEL_7"
            },
            "initializer_range": 0.02,
            "intermediate_size": 3072,
            "layer_norm_eps": 1e-12,
            "max_position_embeddings": 512,
            "model_type": "bert",
            "num_attention_heads": 12,
            "num_hidden_layers": 12,
            "pad_token_id": 0,
            "position_embedding_type": "absolute",
            "problem_type": "multi_label_classification",
            "type_vocab_size": 2,
            "vocab_size": 30522
        })
    }

    #[test]
    fn test_deserialize_bert_base_config() {
        let config: BertConfig = serde_json::from_value(bert_base_config()).unwrap();
        assert_eq!(config.hidden_size, 768);
        assert_eq!(config.num_hidden_layers, 12);
        assert_eq!(config.hidden_act, HiddenAct::Gelu);
        assert_eq!(config.pretrained_config.num_labels(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_optional_fields_use_bert_defaults() {
        let config: BertConfig = serde_json::from_value(json!({
            "vocab_size": 16,
            "hidden_size": 8,
            "num_hidden_layers": 1,
            "num_attention_heads": 2,
            "intermediate_size": 16,
            "max_position_embeddings": 64
        }))
        .unwrap();
        assert_eq!(config.hidden_act, HiddenAct::Gelu);
        assert_eq!(config.type_vocab_size, 2);
        assert_eq!(config.layer_norm_eps, 1e-12);
        assert_eq!(config.hidden_dropout_prob, 0.1);
        assert!(config.classifier_dropout.is_none());
    }

    #[test]
    fn test_zero_attention_heads_is_invalid() {
        let mut config = bert_base_config();
        config["num_attention_heads"] = json!(0);
        let config: BertConfig = serde_json::from_value(config).unwrap();
        assert!(matches!(config.validate(), Err(Error::ModelLoad(_))));
    }

    #[test]
    fn test_indivisible_hidden_size_is_invalid() {
        let mut config = bert_base_config();
        config["num_attention_heads"] = json!(7);
        let config: BertConfig = serde_json::from_value(config).unwrap();
        assert!(matches!(config.validate(), Err(Error::ModelLoad(_))));
    }
}
