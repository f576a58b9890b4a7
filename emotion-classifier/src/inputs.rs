use candle_core::{Device, Tensor};

use crate::Result;

/// What a sequence classification head consumes: token ids and attention mask, both with shape
/// `(batch_size, seq_len)`. There are no token type ids, every token belongs to the first segment.
#[derive(Debug, Clone)]
pub struct ClassifierInputs {
    input_ids: Tensor,
    attention_mask: Tensor,
}

impl ClassifierInputs {
    pub fn new(input_ids: Tensor, attention_mask: Tensor) -> Self {
        Self {
            input_ids,
            attention_mask,
        }
    }

    pub fn get_input_ids(&self) -> &Tensor {
        &self.input_ids
    }

    pub fn get_attention_mask(&self) -> &Tensor {
        &self.attention_mask
    }

    pub fn to_device(&self, device: &Device) -> Result<Self> {
        Ok(Self {
            input_ids: self.input_ids.to_device(device)?,
            attention_mask: self.attention_mask.to_device(device)?,
        })
    }
}
