use candle_core::{DType, IndexOp, Module, Tensor};
use candle_nn::{embedding, linear, ops::softmax_last_dim, Dropout, Embedding, LayerNorm, Linear};
use candle_nn::{Init, VarBuilder};
use emotion_classifier::{ClassifierInputs, Error, Result};

use super::config::{BertConfig, HiddenAct};
use crate::config::PretrainedConfig;
use crate::model::PreTrainedModel;
use crate::utils::attn_mask::get_extended_attention_mask;

/// Loads a layer norm, accepting both the `weight`/`bias` naming and the `gamma`/`beta` naming
/// used by older checkpoints.
fn layer_norm(size: usize, eps: f64, vb: VarBuilder) -> candle_core::Result<LayerNorm> {
    let (weight_name, bias_name) = if vb.contains_tensor("gamma") {
        ("gamma", "beta")
    } else {
        ("weight", "bias")
    };
    let weight = vb.get_with_hints(size, weight_name, Init::Const(1.))?;
    let bias = vb.get_with_hints(size, bias_name, Init::Const(0.))?;
    Ok(LayerNorm::new(weight, bias, eps))
}

struct HiddenActLayer {
    act: HiddenAct,
}

impl HiddenActLayer {
    fn new(act: HiddenAct) -> Self {
        Self { act }
    }
}

impl Module for HiddenActLayer {
    fn forward(&self, hidden_states: &Tensor) -> candle_core::Result<Tensor> {
        match self.act {
            HiddenAct::Gelu => hidden_states.gelu_erf(),
            HiddenAct::GeluNew => hidden_states.gelu(),
            HiddenAct::Relu => hidden_states.relu(),
        }
    }
}

struct BertEmbeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    layer_norm: LayerNorm,
    dropout: Dropout,
}

impl BertEmbeddings {
    fn load(vb: VarBuilder, config: &BertConfig) -> candle_core::Result<Self> {
        let word_embeddings = embedding(
            config.vocab_size,
            config.hidden_size,
            vb.pp("word_embeddings"),
        )?;
        let position_embeddings = embedding(
            config.max_position_embeddings,
            config.hidden_size,
            vb.pp("position_embeddings"),
        )?;
        let token_type_embeddings = embedding(
            config.type_vocab_size,
            config.hidden_size,
            vb.pp("token_type_embeddings"),
        )?;
        let layer_norm = layer_norm(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("LayerNorm"),
        )?;
        Ok(Self {
            word_embeddings,
            position_embeddings,
            token_type_embeddings,
            layer_norm,
            dropout: Dropout::new(config.hidden_dropout_prob),
        })
    }

    /// Every token belongs to the first segment, so the token type embedding is always the one
    /// of id `0`.
    fn forward(&self, input_ids: &Tensor) -> candle_core::Result<Tensor> {
        let (_bsize, seq_len) = input_ids.dims2()?;
        let input_embeddings = self.word_embeddings.forward(input_ids)?;
        let token_type_ids = input_ids.zeros_like()?;
        let token_type_embeddings = self.token_type_embeddings.forward(&token_type_ids)?;
        let position_ids = Tensor::arange(0u32, seq_len as u32, input_ids.device())?;
        let position_embeddings = self.position_embeddings.forward(&position_ids)?;
        let embeddings =
            (input_embeddings + token_type_embeddings)?.broadcast_add(&position_embeddings)?;
        let embeddings = self.layer_norm.forward(&embeddings)?;
        self.dropout.forward(&embeddings, false)
    }
}

struct BertSelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    dropout: Dropout,
    num_attention_heads: usize,
    attention_head_size: usize,
}

impl BertSelfAttention {
    fn load(vb: VarBuilder, config: &BertConfig) -> candle_core::Result<Self> {
        let attention_head_size = config.hidden_size / config.num_attention_heads;
        let all_head_size = config.num_attention_heads * attention_head_size;
        let hidden_size = config.hidden_size;
        let query = linear(hidden_size, all_head_size, vb.pp("query"))?;
        let key = linear(hidden_size, all_head_size, vb.pp("key"))?;
        let value = linear(hidden_size, all_head_size, vb.pp("value"))?;
        Ok(Self {
            query,
            key,
            value,
            dropout: Dropout::new(config.attention_probs_dropout_prob),
            num_attention_heads: config.num_attention_heads,
            attention_head_size,
        })
    }

    fn transpose_for_scores(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let mut new_x_shape = xs.dims().to_vec();
        new_x_shape.pop();
        new_x_shape.push(self.num_attention_heads);
        new_x_shape.push(self.attention_head_size);
        let xs = xs.reshape(new_x_shape.as_slice())?.transpose(1, 2)?;
        xs.contiguous()
    }

    fn forward(
        &self,
        hidden_states: &Tensor,
        attention_mask: &Tensor,
    ) -> candle_core::Result<Tensor> {
        let query_layer = self.transpose_for_scores(&self.query.forward(hidden_states)?)?;
        let key_layer = self.transpose_for_scores(&self.key.forward(hidden_states)?)?;
        let value_layer = self.transpose_for_scores(&self.value.forward(hidden_states)?)?;

        let attention_scores = query_layer.matmul(&key_layer.t()?)?;
        let attention_scores = (attention_scores / (self.attention_head_size as f64).sqrt())?;
        let attention_scores = attention_scores.broadcast_add(attention_mask)?;
        let attention_probs = softmax_last_dim(&attention_scores)?;
        let attention_probs = self.dropout.forward(&attention_probs, false)?;

        let context_layer = attention_probs.matmul(&value_layer)?;
        let context_layer = context_layer.transpose(1, 2)?.contiguous()?;
        context_layer.flatten_from(candle_core::D::Minus2)
    }
}

/// Dense projection followed by a residual connection and a layer norm. Used both after the
/// self-attention and after the intermediate layer.
struct BertResidualOutput {
    dense: Linear,
    layer_norm: LayerNorm,
    dropout: Dropout,
}

impl BertResidualOutput {
    fn load(vb: VarBuilder, in_size: usize, config: &BertConfig) -> candle_core::Result<Self> {
        let dense = linear(in_size, config.hidden_size, vb.pp("dense"))?;
        let layer_norm = layer_norm(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("LayerNorm"),
        )?;
        Ok(Self {
            dense,
            layer_norm,
            dropout: Dropout::new(config.hidden_dropout_prob),
        })
    }

    fn forward(
        &self,
        hidden_states: &Tensor,
        input_tensor: &Tensor,
    ) -> candle_core::Result<Tensor> {
        let hidden_states = self.dense.forward(hidden_states)?;
        let hidden_states = self.dropout.forward(&hidden_states, false)?;
        self.layer_norm.forward(&(hidden_states + input_tensor)?)
    }
}

struct BertAttention {
    self_attention: BertSelfAttention,
    self_output: BertResidualOutput,
}

impl BertAttention {
    fn load(vb: VarBuilder, config: &BertConfig) -> candle_core::Result<Self> {
        let self_attention = BertSelfAttention::load(vb.pp("self"), config)?;
        let self_output = BertResidualOutput::load(vb.pp("output"), config.hidden_size, config)?;
        Ok(Self {
            self_attention,
            self_output,
        })
    }

    fn forward(
        &self,
        input_tensor: &Tensor,
        attention_mask: &Tensor,
    ) -> candle_core::Result<Tensor> {
        let self_outputs = self.self_attention.forward(input_tensor, attention_mask)?;
        self.self_output.forward(&self_outputs, input_tensor)
    }
}

struct BertIntermediate {
    dense: Linear,
    intermediate_act: HiddenActLayer,
}

impl BertIntermediate {
    fn load(vb: VarBuilder, config: &BertConfig) -> candle_core::Result<Self> {
        let dense = linear(config.hidden_size, config.intermediate_size, vb.pp("dense"))?;
        Ok(Self {
            dense,
            intermediate_act: HiddenActLayer::new(config.hidden_act),
        })
    }
}

impl Module for BertIntermediate {
    fn forward(&self, hidden_states: &Tensor) -> candle_core::Result<Tensor> {
        let hidden_states = self.dense.forward(hidden_states)?;
        self.intermediate_act.forward(&hidden_states)
    }
}

struct BertLayer {
    attention: BertAttention,
    intermediate: BertIntermediate,
    output: BertResidualOutput,
}

impl BertLayer {
    fn load(vb: VarBuilder, config: &BertConfig) -> candle_core::Result<Self> {
        let attention = BertAttention::load(vb.pp("attention"), config)?;
        let intermediate = BertIntermediate::load(vb.pp("intermediate"), config)?;
        let output = BertResidualOutput::load(vb.pp("output"), config.intermediate_size, config)?;
        Ok(Self {
            attention,
            intermediate,
            output,
        })
    }

    fn forward(
        &self,
        hidden_states: &Tensor,
        attention_mask: &Tensor,
    ) -> candle_core::Result<Tensor> {
        let attention_output = self.attention.forward(hidden_states, attention_mask)?;
        let intermediate_output = self.intermediate.forward(&attention_output)?;
        self.output.forward(&intermediate_output, &attention_output)
    }
}

struct BertEncoder {
    layers: Vec<BertLayer>,
}

impl BertEncoder {
    fn load(vb: VarBuilder, config: &BertConfig) -> candle_core::Result<Self> {
        let layers = (0..config.num_hidden_layers)
            .map(|index| BertLayer::load(vb.pp(format!("layer.{index}")), config))
            .collect::<candle_core::Result<Vec<_>>>()?;
        Ok(Self { layers })
    }

    fn forward(
        &self,
        hidden_states: &Tensor,
        attention_mask: &Tensor,
    ) -> candle_core::Result<Tensor> {
        let mut hidden_states = hidden_states.clone();
        for layer in self.layers.iter() {
            hidden_states = layer.forward(&hidden_states, attention_mask)?;
        }
        Ok(hidden_states)
    }
}

struct BertPooler {
    dense: Linear,
}

impl BertPooler {
    fn load(vb: VarBuilder, config: &BertConfig) -> candle_core::Result<Self> {
        let dense = linear(config.hidden_size, config.hidden_size, vb.pp("dense"))?;
        Ok(Self { dense })
    }
}

impl Module for BertPooler {
    fn forward(&self, hidden_states: &Tensor) -> candle_core::Result<Tensor> {
        let first_token_tensor = hidden_states.i((.., 0))?;
        let pooled_output = self.dense.forward(&first_token_tensor)?;
        pooled_output.tanh()
    }
}

struct Bert {
    embeddings: BertEmbeddings,
    encoder: BertEncoder,
    pooler: BertPooler,
}

impl Bert {
    fn load(vb: VarBuilder, config: &BertConfig) -> candle_core::Result<Self> {
        let embeddings = BertEmbeddings::load(vb.pp("embeddings"), config)?;
        let encoder = BertEncoder::load(vb.pp("encoder"), config)?;
        let pooler = BertPooler::load(vb.pp("pooler"), config)?;
        Ok(Self {
            embeddings,
            encoder,
            pooler,
        })
    }

    /// Returns the pooled output, with shape `(batch_size, hidden_size)`.
    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        let embedding_output = self.embeddings.forward(input_ids)?;
        let sequence_output = self.encoder.forward(&embedding_output, attention_mask)?;
        self.pooler.forward(&sequence_output)
    }
}

/// BERT encoder with a linear classification head on top of the pooled `[CLS]` output.
pub struct BertForSequenceClassification {
    model: Bert,
    dropout: Dropout,
    classifier: Linear,
    config: PretrainedConfig,
    dtype: DType,
}

impl BertForSequenceClassification {
    fn load_with_config(vb: VarBuilder, config: BertConfig) -> candle_core::Result<Self> {
        let dtype = vb.dtype();
        let model = Bert::load(vb.pp("bert"), &config)?;
        let dropout = Dropout::new(config.classifier_dropout.unwrap_or(config.hidden_dropout_prob));
        let classifier = linear(
            config.hidden_size,
            config.pretrained_config.num_labels(),
            vb.pp("classifier"),
        )?;

        Ok(Self {
            model,
            dropout,
            classifier,
            config: config.pretrained_config,
            dtype,
        })
    }

    fn forward_logits(&self, inputs: &ClassifierInputs) -> candle_core::Result<Tensor> {
        let attention_mask = get_extended_attention_mask(inputs.get_attention_mask(), self.dtype)?;
        let pooled_output = self
            .model
            .forward(inputs.get_input_ids(), &attention_mask)?;
        let pooled_output = self.dropout.forward(&pooled_output, false)?;
        self.classifier.forward(&pooled_output)
    }
}

impl PreTrainedModel for BertForSequenceClassification {
    fn load(vb: VarBuilder, config: serde_json::Value) -> Result<Self> {
        let config: BertConfig =
            serde_json::from_value(config).map_err(|e| Error::ModelLoad(e.to_string()))?;
        config.validate()?;
        Self::load_with_config(vb, config).map_err(|e| Error::ModelLoad(e.to_string()))
    }

    fn default_dtype() -> DType {
        DType::F32
    }

    fn config(&self) -> &PretrainedConfig {
        &self.config
    }

    fn forward(&self, inputs: &ClassifierInputs) -> Result<Tensor> {
        self.forward_logits(inputs)
            .map_err(|e| Error::Inference(e.to_string()))
    }
}
