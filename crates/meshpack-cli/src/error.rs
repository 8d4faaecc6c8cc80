//! CLI error types with exit code handling
//!
//! Every command returns [`CliError`]; `main` prints it as a miette report
//! and exits with [`CliError::exit_code`].

use meshpack_core::CoreError;
use meshpack_render::RenderError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Layer, parameter or dependency checks failed
    #[error("Validation failed: {message}")]
    #[diagnostic(code(meshpack::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Template expansion or chart rendering failed
    #[error("Template error: {message}")]
    #[diagnostic(code(meshpack::cli::template))]
    Template {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Application spec loading or structure error
    #[error("Spec error: {message}")]
    #[diagnostic(code(meshpack::cli::spec))]
    Spec {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("IO error: {message}")]
    #[diagnostic(code(meshpack::cli::io))]
    Io { message: String },

    #[error("{message}")]
    #[diagnostic(code(meshpack::cli::error))]
    Other { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Template { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Spec { .. } => exit_codes::SPEC_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn spec(message: impl Into<String>, help: Option<String>) -> Self {
        Self::Spec {
            message: message.into(),
            help,
        }
    }
}

/// Display an error followed by its source chain, `outer: inner: ...`
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        // `#[from]` wrappers already embed their source's message
        if !message.ends_with(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            other => CliError::spec(error_chain(&other), None),
        }
    }
}

impl From<RenderError> for CliError {
    fn from(err: RenderError) -> Self {
        let message = error_chain(&err);
        match err {
            RenderError::MissingInputForRequiredLayer { .. }
            | RenderError::MissingInputForRequiredParameter { .. }
            | RenderError::UnrecognizedParameter { .. }
            | RenderError::IncorrectNumberOfInputLayers { .. }
            | RenderError::DependencyValidation(_) => CliError::Validation {
                message,
                help: None,
            },
            RenderError::FailedRenderValueTemplates(te) => CliError::Template {
                message,
                help: te.suggestion,
            },
            RenderError::FailedToRenderManifests { .. } | RenderError::FailedToConvertManifests(_) => {
                CliError::Template {
                    message,
                    help: None,
                }
            }
            RenderError::MissingInstallSpec
            | RenderError::NoInstallationSteps
            | RenderError::UnnamedInstallationStep { .. }
            | RenderError::DuplicateStepName { .. }
            | RenderError::ValuesParse { .. }
            | RenderError::Core(_) => CliError::Spec {
                message,
                help: None,
            },
            _ => CliError::Other { message },
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
