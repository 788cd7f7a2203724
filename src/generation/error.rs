use thiserror::Error;

use crate::compiler::Diagnostic;

/// Why a generation could not be built.
#[derive(Debug, Clone, Error)]
pub enum ConstructionFailure {
    #[error("compile failed: {0}")]
    Compile(Diagnostic),

    #[error("instantiation failed: {0}")]
    Instantiation(String),

    #[error("root object has unexpected type `{found}`")]
    RootTypeMismatch { found: String },
}

impl ConstructionFailure {
    /// Short label for status lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Compile(_) => "compile",
            Self::Instantiation(_) => "instantiation",
            Self::RootTypeMismatch { .. } => "root type check",
        }
    }
}
