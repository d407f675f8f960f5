//! Error types for initialization.
//!
//! Every error here is fatal: the viewer either initializes once or shows a
//! fallback message and exits. Nothing after initialization returns an error.

use thiserror::Error;

use crate::gl::ShaderStage;

/// Shader compilation or program link failure, carrying the diagnostic log.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShaderError {
    #[error("Error in {stage} shader:  {log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("Link error in program:  {0}")]
    Link(String),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but a value is out of range.
    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Fatal initialization errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// The window or its drawing surface could not be created.
    #[error("could not get a graphics context: {0}")]
    Context(String),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Text shown to the user in place of the rendered surface.
    pub fn fallback_message(&self) -> String {
        match self {
            AppError::Context(_) => "Sorry, could not get a graphics context.".to_string(),
            other => format!("Sorry, could not initialize the graphics context: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_fallback_embeds_diagnostic() {
        let err = AppError::from(ShaderError::Compile {
            stage: ShaderStage::Vertex,
            log: "ERROR: 0:1: 'bogus' : syntax error".to_string(),
        });
        let message = err.fallback_message();
        assert!(message.starts_with("Sorry, could not initialize"));
        assert!(message.contains("Error in vertex shader"));
        assert!(message.contains("'bogus' : syntax error"));
    }

    #[test]
    fn context_fallback_is_fixed_text() {
        let err = AppError::Context("no video device".to_string());
        assert_eq!(err.fallback_message(), "Sorry, could not get a graphics context.");
    }
}
