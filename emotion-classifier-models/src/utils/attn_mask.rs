use candle_core::{DType, Result, Tensor};

/// Creates a broadcastable attention mask to ignore padding tokens. Positions to attend get `0`
/// and masked positions get the lowest value of `dtype`, so the mask can be added to the
/// attention scores before the softmax.
///
/// # Arguments
///
/// * `attention_mask` - The attention mask tensor with shape `(batch_size, seq_len)`, where `1`
///   marks the tokens to attend.
/// * `dtype` - The data type of the attention mask tensor to create.
///
/// # Returns
///
/// The broadcastable attention mask tensor with shape `(batch_size, 1, 1, seq_len)`.
pub fn get_extended_attention_mask(attention_mask: &Tensor, dtype: DType) -> Result<Tensor> {
    let extended_attention_mask = attention_mask
        .to_dtype(DType::U8)?
        .unsqueeze(1)?
        .unsqueeze(2)?;
    let on_true = extended_attention_mask.zeros_like()?.to_dtype(dtype)?;
    let on_false = Tensor::new(f32::MIN, extended_attention_mask.device())?
        .to_dtype(dtype)?
        .broadcast_as(extended_attention_mask.shape())?;
    extended_attention_mask.where_cond(&on_true, &on_false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_extended_attention_mask() {
        let attention_mask = Tensor::new(&[[1u8, 1, 0], [1, 0, 0]], &Device::Cpu).unwrap();
        let mask = get_extended_attention_mask(&attention_mask, DType::F32).unwrap();
        assert_eq!(mask.dims4().unwrap(), (2, 1, 1, 3));
        let values = mask.squeeze(1).unwrap().squeeze(1).unwrap();
        let values = values.to_vec2::<f32>().unwrap();
        assert_eq!(values, vec![vec![0.0, 0.0, f32::MIN], vec![0.0, f32::MIN, f32::MIN]]);
    }
}
