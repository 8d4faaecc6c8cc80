//! Render pipeline error types

use meshpack_core::{CoreError, ValuesInputs};
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fmt;
use thiserror::Error;

/// Boxed error returned by injected collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, RenderError>;

/// Where a values document came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuesOrigin {
    Spec,
    Layer { layer: String, option: String },
    Params,
    User,
}

impl fmt::Display for ValuesOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spec => write!(f, "spec"),
            Self::Layer { layer, option } => write!(f, "layer '{}' option '{}'", layer, option),
            Self::Params => write!(f, "params"),
            Self::User => write!(f, "user"),
        }
    }
}

/// Errors produced by the render pipeline
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RenderError {
    #[error("missing installation spec")]
    MissingInstallSpec,

    #[error(
        "error rendering manifests from {source_ref} for release '{release_name}' in namespace '{namespace}'"
    )]
    FailedToRenderManifests {
        source_ref: String,
        values: String,
        release_name: String,
        namespace: String,
        #[source]
        cause: SourceError,
    },

    #[error("error converting manifests to raw resources")]
    FailedToConvertManifests(#[source] CoreError),

    #[error("error rendering input value templates")]
    FailedRenderValueTemplates(#[source] TemplateError),

    #[error("error retrieving input for required layer '{layer}'")]
    MissingInputForRequiredLayer {
        layer: String,
        #[source]
        cause: CoreError,
    },

    #[error("missing input for required parameter {name}")]
    MissingInputForRequiredParameter { name: String },

    #[error(
        "parameter {name} is not specified on the selected versioned application spec, flavor, or layer option"
    )]
    UnrecognizedParameter { name: String },

    #[error("incorrect number of input layers: {supplied} supplied, {required} required")]
    IncorrectNumberOfInputLayers { supplied: usize, required: usize },

    #[error("error parsing {origin} values")]
    ValuesParse {
        origin: ValuesOrigin,
        input: String,
        #[source]
        cause: CoreError,
    },

    #[error("must provide at least one installation step")]
    NoInstallationSteps,

    #[error("installation step {index} must be named")]
    UnnamedInstallationStep { index: usize },

    #[error("step names must be unique; {name} duplicated")]
    DuplicateStepName { name: String },

    #[error(transparent)]
    DependencyValidation(BoxError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl RenderError {
    /// Wrap a collaborator failure with the full request context
    pub fn failed_to_render(
        source_ref: impl Into<String>,
        values: impl Into<String>,
        inputs: &ValuesInputs,
        cause: SourceError,
    ) -> Self {
        Self::FailedToRenderManifests {
            source_ref: source_ref.into(),
            values: values.into(),
            release_name: inputs.name.clone(),
            namespace: inputs.install_namespace.clone(),
            cause,
        }
    }

    /// Tag a parse failure with the values text and its origin
    pub fn values_parse(origin: ValuesOrigin, input: impl Into<String>, cause: CoreError) -> Self {
        Self::ValuesParse {
            origin,
            input: input.into(),
            cause,
        }
    }
}

/// Errors returned by chart renderers and archive fetchers
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SourceError {
    #[error("unsupported source {source_ref}: {reason}")]
    Unsupported { source_ref: String, reason: String },

    #[error("source not found: {path}")]
    NotFound { path: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Failed { message: String },
}

impl SourceError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    UnknownFunction,
    SyntaxError,
    TypeError,
    InvalidOperation,
    Other,
}

/// Template-specific error with source information
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{template_name}: {message}")]
#[diagnostic(code(meshpack::template::render))]
pub struct TemplateError {
    pub message: String,

    pub kind: TemplateErrorKind,

    /// Name of the template (input field or chart file)
    pub template_name: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    #[help]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Create a template error from a MiniJinja error
    pub fn from_minijinja(err: minijinja::Error, template_name: &str, template_source: &str) -> Self {
        let kind = categorize(&err);
        let span = err
            .line()
            .and_then(|line_num| calculate_span(template_source, line_num));

        let suggestion = match kind {
            TemplateErrorKind::UndefinedVariable => Some(
                "template context fields are: name, installNamespace, meshRef, flavor, layers, \
                 params, specDefinedValues, userDefinedValues"
                    .to_string(),
            ),
            TemplateErrorKind::SyntaxError => {
                Some("check that every `{{` has a matching `}}`".to_string())
            }
            _ => None,
        };

        Self {
            message: err
                .to_string()
                .replace("undefined value", "undefined variable"),
            kind,
            template_name: template_name.to_string(),
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
            suggestion,
        }
    }

    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

fn categorize(err: &minijinja::Error) -> TemplateErrorKind {
    match err.kind() {
        minijinja::ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
        minijinja::ErrorKind::UnknownFilter => TemplateErrorKind::UnknownFilter,
        minijinja::ErrorKind::UnknownFunction => TemplateErrorKind::UnknownFunction,
        minijinja::ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
        minijinja::ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
        minijinja::ErrorKind::NonPrimitive | minijinja::ErrorKind::NonKey => {
            TemplateErrorKind::TypeError
        }
        _ => TemplateErrorKind::Other,
    }
}

/// Calculate the source span for a given line number
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (index, line) in source.lines().enumerate() {
        if index + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }

    None
}
