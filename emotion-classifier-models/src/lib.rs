pub mod config;
pub mod model;
pub mod models;
pub mod utils;

pub use config::{PretrainedConfig, ProblemType};
pub use model::{var_builder, PreTrainedModel};

// BERT
pub use models::bert::{BertConfig, BertForSequenceClassification};
