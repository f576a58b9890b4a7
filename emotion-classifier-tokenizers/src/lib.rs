pub mod config;
pub mod info;
pub mod tokenizer;
pub mod tokenizers;

pub use config::{SpecialTokenEntry, TokenizerConfig};
pub use info::{SpecialToken, TokenizerInfo};
pub use tokenizer::Tokenizer;
pub use crate::tokenizers::bert::{BertTokenizer, BertTokenizerBuilder};
