use std::collections::HashMap;
use std::path::Path;

use emotion_classifier::{Error, Result};
use serde::Deserialize;
use tokenizers::AddedToken;

/// A special token as written in `tokenizer_config.json` or `special_tokens_map.json`: either the
/// bare token or an object with its `content`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SpecialTokenEntry {
    Plain(String),
    Detailed { content: String },
}

impl SpecialTokenEntry {
    pub fn content(&self) -> &str {
        match self {
            SpecialTokenEntry::Plain(content) | SpecialTokenEntry::Detailed { content } => content,
        }
    }
}

/// The subset of `tokenizer_config.json` used to rebuild a WordPiece tokenizer.
#[derive(Debug, Default, Deserialize)]
pub struct TokenizerConfig {
    pub do_lower_case: Option<bool>,
    pub strip_accents: Option<bool>,
    pub tokenize_chinese_chars: Option<bool>,
    /// Some configs store this as a very large float, hence `f64`.
    pub model_max_length: Option<f64>,
    pub cls_token: Option<SpecialTokenEntry>,
    pub mask_token: Option<SpecialTokenEntry>,
    pub pad_token: Option<SpecialTokenEntry>,
    pub sep_token: Option<SpecialTokenEntry>,
    pub unk_token: Option<SpecialTokenEntry>,
    pub added_tokens_decoder: Option<HashMap<u32, AddedToken>>,
}

impl TokenizerConfig {
    /// Gets the maximum number of tokens the model accepts, if the config sets it.
    pub fn get_model_max_length(&self) -> Option<usize> {
        // Float to int casts saturate
        self.model_max_length.map(|max_length| max_length as usize)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::TokenizerBuildError(format!("cannot read `{}`: {e}", path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::TokenizerBuildError(format!("invalid `{}`: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_bert_tokenizer_config() {
        let config: TokenizerConfig = serde_json::from_str(
            r#"{
                "do_lower_case": true,
                "model_max_length": 512,
                "tokenizer_class": "BertTokenizer",
                "pad_token": "[PAD]",
                "unk_token": {"content": "[UNK]", "lstrip": false, "special": true}
            }"#,
        )
        .unwrap();
        assert_eq!(config.do_lower_case, Some(true));
        assert_eq!(config.get_model_max_length(), Some(512));
        assert_eq!(config.pad_token.as_ref().map(|t| t.content()), Some("[PAD]"));
        assert_eq!(config.unk_token.as_ref().map(|t| t.content()), Some("[UNK]"));
        assert!(config.strip_accents.is_none());
    }

    #[test]
    fn test_huge_model_max_length_saturates() {
        let config: TokenizerConfig =
            serde_json::from_str(r#"{"model_max_length": 1000000000000000019884624838656}"#)
                .unwrap();
        assert_eq!(config.get_model_max_length(), Some(usize::MAX));
    }

    #[test]
    fn test_unreadable_config_is_a_build_error() {
        let path = std::env::temp_dir()
            .join("emotion-classifier-no-tokenizer")
            .join("tokenizer_config.json");
        assert!(matches!(
            TokenizerConfig::from_file(&path),
            Err(Error::TokenizerBuildError(_))
        ));
    }
}
