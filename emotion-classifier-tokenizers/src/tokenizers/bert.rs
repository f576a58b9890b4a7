use emotion_classifier::{Error, HubParams, HubRepo, Result};
use tokenizers::decoders::DecoderWrapper;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::processors::template::TemplateProcessing;
use tokenizers::{
    AddedToken, Tokenizer as CoreTokenizer, TokenizerBuilder as CoreTokenizerBuilder,
    TokenizerImpl,
};

use crate::config::TokenizerConfig;
use crate::info::{SpecialToken, TokenizerInfo, Vocab};
use crate::tokenizer::Tokenizer;

const BERT_MAX_LENGTH: usize = 512;

/// Uncased WordPiece tokenizer of BERT models.
#[derive(Debug)]
pub struct BertTokenizer {
    tokenizer: CoreTokenizer,
    max_length: usize,
    pad_token: String,
}

impl Tokenizer for BertTokenizer {
    fn get_tokenizer(&self) -> &CoreTokenizer {
        &self.tokenizer
    }

    fn get_tokenizer_mut(&mut self) -> &mut CoreTokenizer {
        &mut self.tokenizer
    }

    fn get_max_length(&self) -> usize {
        self.max_length
    }

    fn get_pad_token(&self) -> &str {
        &self.pad_token
    }
}

impl BertTokenizer {
    /// Loads the tokenizer from a Hugging Face Hub repository.
    pub fn from_pretrained(repo_id: &str, params: Option<HubParams>) -> Result<Self> {
        Self::from_repo(&HubRepo::open(repo_id, params)?)
    }

    pub fn from_repo(repo: &HubRepo) -> Result<Self> {
        BertTokenizerBuilder::new(TokenizerInfo::from_repo(repo)?).build()
    }
}

struct BertSpecialTokens {
    cls: String,
    mask: String,
    pad: String,
    sep: String,
    unk: String,
}

impl BertSpecialTokens {
    fn resolve(info: &TokenizerInfo) -> Self {
        let token = |name: SpecialToken, default: &str| {
            info.special_token(name).unwrap_or(default).to_string()
        };
        Self {
            cls: token(SpecialToken::Cls, "[CLS]"),
            mask: token(SpecialToken::Mask, "[MASK]"),
            pad: token(SpecialToken::Pad, "[PAD]"),
            sep: token(SpecialToken::Sep, "[SEP]"),
            unk: token(SpecialToken::Unk, "[UNK]"),
        }
    }

    fn added_tokens(&self) -> Vec<AddedToken> {
        [&self.cls, &self.mask, &self.pad, &self.sep, &self.unk]
            .into_iter()
            .map(|token| AddedToken::from(token.clone(), true))
            .collect()
    }
}

/// Builds a [`BertTokenizer`] from `tokenizer.json` when the repository has one, or from
/// `vocab.txt` and `tokenizer_config.json` otherwise.
pub struct BertTokenizerBuilder {
    info: TokenizerInfo,
}

impl BertTokenizerBuilder {
    pub fn new(info: TokenizerInfo) -> Self {
        Self { info }
    }

    pub fn build(self) -> Result<BertTokenizer> {
        let special_tokens = BertSpecialTokens::resolve(&self.info);
        let TokenizerInfo {
            config,
            tokenizer_file,
            vocab,
            ..
        } = self.info;
        let config = config.unwrap_or_default();

        let mut tokenizer = match tokenizer_file {
            Some(path) => CoreTokenizer::from_file(path)
                .map_err(|e| Error::TokenizerBuildError(e.to_string()))?,
            None => {
                let vocab = vocab.ok_or_else(|| {
                    Error::TokenizerBuildError(
                        "the repository has neither `tokenizer.json` nor `vocab.txt`".to_string(),
                    )
                })?;
                build_wordpiece(vocab, &config, &special_tokens)?
            }
        };

        tokenizer.add_special_tokens(&special_tokens.added_tokens());
        if let Some(added_tokens) = &config.added_tokens_decoder {
            tokenizer.add_tokens(&added_tokens.values().cloned().collect::<Vec<_>>());
        }

        Ok(BertTokenizer {
            tokenizer,
            max_length: config.get_model_max_length().unwrap_or(BERT_MAX_LENGTH),
            pad_token: special_tokens.pad,
        })
    }
}

fn build_wordpiece(
    vocab: Vocab,
    config: &TokenizerConfig,
    special_tokens: &BertSpecialTokens,
) -> Result<CoreTokenizer> {
    let token_id = |token: &String| {
        vocab
            .get(token)
            .copied()
            .ok_or_else(|| Error::MissingSpecialToken(token.clone()))
    };
    let cls = (special_tokens.cls.clone(), token_id(&special_tokens.cls)?);
    let sep = (special_tokens.sep.clone(), token_id(&special_tokens.sep)?);
    token_id(&special_tokens.unk)?;

    let model = WordPiece::builder()
        .vocab(vocab)
        .unk_token(special_tokens.unk.clone())
        .continuing_subword_prefix("##".to_string())
        .max_input_chars_per_word(100)
        .build()
        .map_err(|e| Error::TokenizerBuildError(e.to_string()))?;

    // Control characters are always dropped, whatever `clean_up_tokenization_spaces` says: that
    // flag only concerns decoding.
    let normalizer = BertNormalizer::new(
        true,
        config.tokenize_chinese_chars.unwrap_or(true),
        config.strip_accents,
        config.do_lower_case.unwrap_or(true),
    );

    let post_processor = TemplateProcessing::builder()
        .try_single(format!("{} $A {}", cls.0, sep.0))
        .map_err(Error::TokenizerBuildError)?
        .try_pair(format!("{} $A:0 {} $B:1 {}:1", cls.0, sep.0, sep.0))
        .map_err(Error::TokenizerBuildError)?
        .special_tokens(vec![cls, sep])
        .build()
        .map_err(|e| Error::TokenizerBuildError(e.to_string()))?;

    let tokenizer: TokenizerImpl<
        WordPiece,
        BertNormalizer,
        BertPreTokenizer,
        TemplateProcessing,
        DecoderWrapper,
    > = CoreTokenizerBuilder::new()
        .with_model(model)
        .with_normalizer(Some(normalizer))
        .with_pre_tokenizer(Some(BertPreTokenizer {}))
        .with_post_processor(Some(post_processor))
        .build()
        .map_err(|e| Error::TokenizerBuildError(e.to_string()))?;

    Ok(CoreTokenizer::from(tokenizer))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOCAB: [&str; 12] = [
        "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "i", "feel", "lonely", "today", ".", "so",
        "##ly",
    ];

    fn vocab() -> Vocab {
        VOCAB
            .iter()
            .enumerate()
            .map(|(id, token)| (token.to_string(), id as u32))
            .collect()
    }

    fn tokenizer_with_config(config: TokenizerConfig) -> BertTokenizer {
        let info = TokenizerInfo {
            config: Some(config),
            vocab: Some(vocab()),
            ..Default::default()
        };
        BertTokenizerBuilder::new(info).build().unwrap()
    }

    fn tiny_tokenizer() -> BertTokenizer {
        tokenizer_with_config(TokenizerConfig {
            do_lower_case: Some(true),
            ..Default::default()
        })
    }

    fn input_ids(tokenizer: &BertTokenizer, texts: &[&str]) -> Vec<Vec<u32>> {
        tokenizer
            .encode(texts)
            .unwrap()
            .get_input_ids()
            .to_vec2::<u32>()
            .unwrap()
    }

    #[test]
    fn test_special_token_ids() {
        let tokenizer = tiny_tokenizer();
        assert_eq!(tokenizer.get_token_id("[CLS]"), Some(2));
        assert_eq!(tokenizer.get_token_id("[SEP]"), Some(3));
        assert_eq!(tokenizer.get_token_id(tokenizer.get_pad_token()), Some(0));
        assert_eq!(tokenizer.get_max_length(), BERT_MAX_LENGTH);
    }

    #[test]
    fn test_encode_adds_special_tokens() {
        let tokenizer = tiny_tokenizer();
        let inputs = tokenizer.encode(&["I feel LONELY today."]).unwrap();
        let ids = inputs.get_input_ids().to_vec2::<u32>().unwrap();
        assert_eq!(ids, vec![vec![2, 5, 6, 7, 8, 9, 3]]);
        let mask = inputs.get_attention_mask().to_vec2::<u8>().unwrap();
        assert_eq!(mask, vec![vec![1; 7]]);
    }

    #[test]
    fn test_control_characters_are_removed() {
        let config: TokenizerConfig = serde_json::from_str(
            r#"{"do_lower_case": true, "clean_up_tokenization_spaces": false}"#,
        )
        .unwrap();
        let tokenizer = tokenizer_with_config(config);
        assert_eq!(input_ids(&tokenizer, &["i \u{7}feel"]), vec![vec![2, 5, 6, 3]]);
    }

    #[test]
    fn test_missing_config_uses_uncased_defaults() {
        let info = TokenizerInfo {
            vocab: Some(vocab()),
            ..Default::default()
        };
        let tokenizer = BertTokenizerBuilder::new(info).build().unwrap();
        assert_eq!(input_ids(&tokenizer, &["FEEL"]), vec![vec![2, 6, 3]]);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let tokenizer = tiny_tokenizer();
        assert_eq!(input_ids(&tokenizer, &["zebra"]), vec![vec![2, 1, 3]]);
    }

    #[test]
    fn test_truncation_keeps_special_tokens() {
        let mut tokenizer = tiny_tokenizer();
        tokenizer.set_truncation(5).unwrap();
        assert_eq!(
            input_ids(&tokenizer, &["i feel so so so lonely today"]),
            vec![vec![2, 5, 6, 10, 3]]
        );
    }

    #[test]
    fn test_truncation_is_capped_to_model_max_length() {
        let mut tokenizer = tiny_tokenizer();
        tokenizer.set_truncation(10_000).unwrap();
        let text = vec!["so"; 600].join(" ");
        let inputs = tokenizer.encode(&[text.as_str()]).unwrap();
        assert_eq!(inputs.get_input_ids().dims2().unwrap(), (1, BERT_MAX_LENGTH));
    }

    #[test]
    fn test_padding_longest() {
        let mut tokenizer = tiny_tokenizer();
        tokenizer.enable_padding().unwrap();
        let inputs = tokenizer.encode(&["i feel lonely", "today"]).unwrap();
        let ids = inputs.get_input_ids().to_vec2::<u32>().unwrap();
        assert_eq!(ids, vec![vec![2, 5, 6, 7, 3], vec![2, 8, 3, 0, 0]]);
        let mask = inputs.get_attention_mask().to_vec2::<u8>().unwrap();
        assert_eq!(mask, vec![vec![1, 1, 1, 1, 1], vec![1, 1, 1, 0, 0]]);
    }

    #[test]
    fn test_unpadded_batch_of_different_lengths_fails() {
        let tokenizer = tiny_tokenizer();
        let result = tokenizer.encode(&["i feel lonely", "today"]);
        assert!(matches!(result, Err(Error::TokenizerEncodingError(_))));
    }

    #[test]
    fn test_missing_vocab_fails() {
        let info = TokenizerInfo {
            config: Some(TokenizerConfig::default()),
            ..Default::default()
        };
        assert!(matches!(
            BertTokenizerBuilder::new(info).build(),
            Err(Error::TokenizerBuildError(_))
        ));
    }

    #[test]
    fn test_special_token_outside_vocab_fails() {
        let mut vocab = vocab();
        vocab.remove("[SEP]");
        let info = TokenizerInfo {
            vocab: Some(vocab),
            ..Default::default()
        };
        assert!(matches!(
            BertTokenizerBuilder::new(info).build(),
            Err(Error::MissingSpecialToken(token)) if token == "[SEP]"
        ));
    }
}
