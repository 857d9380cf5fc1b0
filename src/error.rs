#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("serializer [{serializer}] expected number to be in the range [{min}, {max}], got {value}")]
    NumberOutOfRange {
        serializer: String,
        min: String,
        max: String,
        value: String,
    },
    #[error("expected [{serializer}] to have {expected} items, got {actual}")]
    InvalidNumberOfItems {
        serializer: String,
        expected: usize,
        actual: usize,
    },
    #[error("expected a string of base {base}, got [{value}]")]
    InvalidBaseString { base: usize, value: String },
    #[error("invalid enum variant for [{serializer}]: expected one of [{expected}], got {variant}")]
    InvalidEnumVariant {
        serializer: String,
        variant: String,
        expected: String,
    },
    #[error("serializer [{serializer}] expected {expected} bytes, got {actual}")]
    NotEnoughBytes {
        serializer: String,
        expected: usize,
        actual: usize,
    },
    #[error("serializer [{serializer}] cannot deserialize empty buffers")]
    EmptyBuffer { serializer: String },
    #[error("invalid composition: {0}")]
    InvalidComposition(String),
    #[error("serializer [{serializer}] left {remaining} trailing bytes")]
    TrailingBytes { serializer: String, remaining: usize },
}

impl Error {
    pub(crate) fn empty_buffer(serializer: &str) -> Self {
        Self::EmptyBuffer {
            serializer: serializer.to_string(),
        }
    }

    pub(crate) fn expected_fixed_size(message: impl Into<String>) -> Self {
        Self::InvalidComposition(message.into())
    }
}
