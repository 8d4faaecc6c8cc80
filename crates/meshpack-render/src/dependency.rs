//! Resource dependency validation hook
//!
//! The pipeline never inspects [`ResourceDependency`] values itself; it hands
//! each selected option's dependencies to the injected validator once.

use meshpack_core::ResourceDependency;

use crate::error::BoxError;

/// Validates the resource dependencies of a selected layer option
pub trait DependencyValidator: Send + Sync {
    fn validate(&self, dependencies: &[ResourceDependency]) -> Result<(), BoxError>;
}

impl<F> DependencyValidator for F
where
    F: Fn(&[ResourceDependency]) -> Result<(), BoxError> + Send + Sync,
{
    fn validate(&self, dependencies: &[ResourceDependency]) -> Result<(), BoxError> {
        self(dependencies)
    }
}

/// Accepts every dependency set
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl DependencyValidator for NoopValidator {
    fn validate(&self, _dependencies: &[ResourceDependency]) -> Result<(), BoxError> {
        Ok(())
    }
}
