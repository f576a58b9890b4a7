use std::collections::HashMap;
use std::path::{Path, PathBuf};

use emotion_classifier::{Error, HubRepo, Result};
use serde::Deserialize;

use crate::config::{SpecialTokenEntry, TokenizerConfig};

const TOKENIZER_CONFIG_FILE: &str = "tokenizer_config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const VOCAB_TXT_FILE: &str = "vocab.txt";
const SPECIAL_TOKENS_MAP_FILE: &str = "special_tokens_map.json";

/// The vocabulary of a WordPiece model, mapping each token to its id.
pub type Vocab = HashMap<String, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialToken {
    Cls,
    Mask,
    Pad,
    Sep,
    Unk,
}

/// `special_tokens_map.json`
#[derive(Debug, Default, Deserialize)]
pub struct SpecialTokensMap {
    pub cls_token: Option<SpecialTokenEntry>,
    pub mask_token: Option<SpecialTokenEntry>,
    pub pad_token: Option<SpecialTokenEntry>,
    pub sep_token: Option<SpecialTokenEntry>,
    pub unk_token: Option<SpecialTokenEntry>,
}

impl SpecialTokensMap {
    fn get(&self, token: SpecialToken) -> Option<&SpecialTokenEntry> {
        match token {
            SpecialToken::Cls => self.cls_token.as_ref(),
            SpecialToken::Mask => self.mask_token.as_ref(),
            SpecialToken::Pad => self.pad_token.as_ref(),
            SpecialToken::Sep => self.sep_token.as_ref(),
            SpecialToken::Unk => self.unk_token.as_ref(),
        }
    }
}

impl TokenizerConfig {
    fn special_token(&self, token: SpecialToken) -> Option<&SpecialTokenEntry> {
        match token {
            SpecialToken::Cls => self.cls_token.as_ref(),
            SpecialToken::Mask => self.mask_token.as_ref(),
            SpecialToken::Pad => self.pad_token.as_ref(),
            SpecialToken::Sep => self.sep_token.as_ref(),
            SpecialToken::Unk => self.unk_token.as_ref(),
        }
    }
}

/// The tokenizer files found in a model repository. Every one of them is optional, the tokenizer
/// builder decides which combinations it can work with.
#[derive(Debug, Default)]
pub struct TokenizerInfo {
    pub config: Option<TokenizerConfig>,
    pub tokenizer_file: Option<PathBuf>,
    pub vocab: Option<Vocab>,
    pub special_tokens_map: Option<SpecialTokensMap>,
}

impl TokenizerInfo {
    /// Collects the tokenizer files of `repo`. Files that exist but can't be parsed are errors.
    pub fn from_repo(repo: &HubRepo) -> Result<Self> {
        if let Ok(model_config) = repo.model_config() {
            match model_config["model_type"].as_str() {
                Some("bert") | None => {}
                Some(model_type) => tracing::warn!(
                    "Repository '{}' holds a '{}' model, loading it with a BERT tokenizer",
                    repo.id(),
                    model_type
                ),
            }
        }

        let config = repo
            .get_file(TOKENIZER_CONFIG_FILE)
            .map(|path| TokenizerConfig::from_file(&path))
            .transpose()?;
        let vocab = repo
            .get_file(VOCAB_TXT_FILE)
            .map(|path| load_vocab_txt(&path))
            .transpose()?;
        let special_tokens_map = repo
            .get_file(SPECIAL_TOKENS_MAP_FILE)
            .map(|path| load_special_tokens_map(&path))
            .transpose()?;

        Ok(Self {
            config,
            tokenizer_file: repo.get_file(TOKENIZER_FILE),
            vocab,
            special_tokens_map,
        })
    }

    /// Gets a special token from `special_tokens_map.json`, falling back to `tokenizer_config.json`.
    pub fn special_token(&self, token: SpecialToken) -> Option<&str> {
        self.special_tokens_map
            .as_ref()
            .and_then(|map| map.get(token))
            .or_else(|| {
                self.config
                    .as_ref()
                    .and_then(|config| config.special_token(token))
            })
            .map(SpecialTokenEntry::content)
    }
}

fn load_vocab_txt(path: &Path) -> Result<Vocab> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::TokenizerBuildError(format!("cannot read `{VOCAB_TXT_FILE}`: {e}")))?;
    Ok(parse_vocab_txt(&contents))
}

/// One token per line, the line number being the token id.
fn parse_vocab_txt(contents: &str) -> Vocab {
    contents
        .lines()
        .enumerate()
        .map(|(id, token)| (token.to_string(), id as u32))
        .collect()
}

fn load_special_tokens_map(path: &Path) -> Result<SpecialTokensMap> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::TokenizerBuildError(format!("cannot read `{SPECIAL_TOKENS_MAP_FILE}`: {e}"))
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        Error::TokenizerBuildError(format!("invalid `{SPECIAL_TOKENS_MAP_FILE}`: {e}"))
    })
}
