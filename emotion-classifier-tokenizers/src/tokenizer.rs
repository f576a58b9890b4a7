use candle_core::{Device, Tensor};
use emotion_classifier::{ClassifierInputs, Error, Result};
use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer as CoreTokenizer,
    TruncationDirection, TruncationParams, TruncationStrategy,
};

/// A `tokenizers::Tokenizer` that turns texts into the inputs of a sequence classifier.
///
/// Padding and truncation are configured once through `&mut self` before the tokenizer gets
/// shared; encoding only needs `&self`.
pub trait Tokenizer: std::fmt::Debug + Send + Sync {
    fn get_tokenizer(&self) -> &CoreTokenizer;

    fn get_tokenizer_mut(&mut self) -> &mut CoreTokenizer;

    /// Maximum number of tokens the model accepts.
    fn get_max_length(&self) -> usize;

    fn get_pad_token(&self) -> &str;

    fn get_token_id(&self, token: &str) -> Option<u32> {
        self.get_tokenizer().token_to_id(token)
    }

    /// Pads every sequence of a batch on the right to the longest one.
    fn enable_padding(&mut self) -> Result<()> {
        let pad_token = self.get_pad_token().to_string();
        let pad_id = self
            .get_token_id(&pad_token)
            .ok_or_else(|| Error::MissingSpecialToken(pad_token.clone()))?;

        self.get_tokenizer_mut().with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            direction: PaddingDirection::Right,
            pad_to_multiple_of: None,
            pad_id,
            pad_type_id: 0,
            pad_token,
        }));
        Ok(())
    }

    /// Truncates every encoded sequence to at most `max_length` tokens, special tokens included.
    /// The requested length is capped to the maximum length of the model.
    fn set_truncation(&mut self, max_length: usize) -> Result<()> {
        let max_length = max_length.min(self.get_max_length());
        self.get_tokenizer_mut()
            .with_truncation(Some(TruncationParams {
                direction: TruncationDirection::Right,
                max_length,
                strategy: TruncationStrategy::LongestFirst,
                stride: 0,
            }))
            .map_err(|e| Error::TokenizerBuildError(e.to_string()))?;
        Ok(())
    }

    /// Encodes `texts` with their special tokens into `(batch_size, seq_len)` CPU tensors of
    /// `u32` token ids and `u8` attention mask.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::TokenizerEncodingError`] if the tokenizer rejects a text, or if the
    /// encoded texts differ in length because padding is not enabled.
    fn encode(&self, texts: &[&str]) -> Result<ClassifierInputs> {
        let encodings = self
            .get_tokenizer()
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| Error::TokenizerEncodingError(e.to_string()))?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map_or(0, |encoding| encoding.len());
        if encodings.iter().any(|encoding| encoding.len() != seq_len) {
            return Err(Error::TokenizerEncodingError(
                "encoded texts have different lengths, padding must be enabled".to_string(),
            ));
        }

        let mut input_ids: Vec<u32> = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask: Vec<u8> = Vec::with_capacity(batch_size * seq_len);
        for encoding in &encodings {
            input_ids.extend_from_slice(encoding.get_ids());
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as u8));
        }

        let shape = (batch_size, seq_len);
        Ok(ClassifierInputs::new(
            Tensor::from_vec(input_ids, shape, &Device::Cpu)?,
            Tensor::from_vec(attention_mask, shape, &Device::Cpu)?,
        ))
    }
}
