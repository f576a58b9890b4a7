use backtrace::Backtrace;
use std::fmt;

/// An error coming from one of the libraries the workspace builds on, together with the backtrace
/// of the place where it was converted.
#[derive(Debug)]
pub struct ExternalError {
    source: Box<dyn std::error::Error + Send + Sync>,
    backtrace: Backtrace,
}

impl ExternalError {
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for ExternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.source.fmt(f)
    }
}

impl std::error::Error for ExternalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    // Resolving and instantiating the model
    #[error("repository `{0}` does not exist or cannot be reached")]
    RepositoryNotFound(String),

    #[error("the repository has no `config.json`")]
    MissingModelConfig,

    #[error("the repository has neither safetensors nor PyTorch weights")]
    ModelWeightsNotFound,

    #[error("the model predicts {found} labels but {expected} labels were given")]
    LabelCountMismatch { expected: usize, found: usize },

    #[error("cannot load the model: {0}")]
    ModelLoad(String),

    // Tokenizer
    #[error("cannot build the tokenizer: {0}")]
    TokenizerBuildError(String),

    #[error("special token `{0}` is not part of the vocabulary")]
    MissingSpecialToken(String),

    #[error("cannot encode the text: {0}")]
    TokenizerEncodingError(String),

    // Running the model
    #[error("device `{0}` is not available")]
    DeviceNotAvailable(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("{0}")]
    Msg(String),

    #[error(transparent)]
    External(#[from] ExternalError),
}

impl Error {
    pub fn external(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::External(ExternalError {
            source: Box::new(e),
            backtrace: Backtrace::new(),
        })
    }

    pub fn msg<T: fmt::Display>(msg: T) -> Self {
        Error::Msg(msg.to_string())
    }

    /// Whether the error means the model could not be resolved, downloaded or instantiated.
    pub fn is_model_load(&self) -> bool {
        matches!(
            self,
            Error::RepositoryNotFound(_)
                | Error::MissingModelConfig
                | Error::ModelWeightsNotFound
                | Error::LabelCountMismatch { .. }
                | Error::ModelLoad(_)
        )
    }

    /// Turns any error raised while loading a model into a model load error, keeping the ones
    /// that already are.
    pub fn into_model_load(self) -> Self {
        if self.is_model_load() {
            self
        } else {
            Error::ModelLoad(self.to_string())
        }
    }
}

macro_rules! impl_from_external {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for Error {
                fn from(e: $error) -> Self {
                    Error::external(e)
                }
            }
        )*
    };
}

impl_from_external!(candle_core::Error, serde_json::Error, std::io::Error);

/// A type alias for `Result<T, Error>` for the `emotion-classifier` crates.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_count_mismatch_message() {
        let err = Error::LabelCountMismatch {
            expected: 8,
            found: 6,
        };
        assert!(err.is_model_load());
        assert_eq!(
            err.to_string(),
            "the model predicts 6 labels but 8 labels were given"
        );
    }

    #[test]
    fn test_into_model_load() {
        let err = Error::TokenizerBuildError("no `vocab.txt`".to_string()).into_model_load();
        match err {
            Error::ModelLoad(msg) => assert_eq!(msg, "cannot build the tokenizer: no `vocab.txt`"),
            other => panic!("unexpected error: {other}"),
        }

        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        assert!(matches!(
            Error::from(io).into_model_load(),
            Error::ModelLoad(msg) if msg == "connection reset"
        ));

        assert!(matches!(
            Error::MissingModelConfig.into_model_load(),
            Error::MissingModelConfig
        ));
    }

    #[test]
    fn test_encoding_error_is_not_model_load() {
        let err = Error::TokenizerEncodingError("bad input".to_string());
        assert!(!err.is_model_load());
    }

    #[test]
    fn test_external_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.json");
        let err = Error::from(io);
        assert_eq!(err.to_string(), "config.json");
        assert!(std::error::Error::source(&err).is_some());
    }
}
