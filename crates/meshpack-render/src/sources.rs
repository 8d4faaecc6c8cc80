//! Collaborators that turn installation sources into manifests

use async_trait::async_trait;
use meshpack_core::{GithubChartRef, Manifests};
use std::fmt;

use crate::error::SourceError;

/// A renderable chart location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartSource<'a> {
    /// Chart directory inside a GitHub repository
    Github(&'a GithubChartRef),
    /// Packaged chart archive URI
    Archive(&'a str),
}

impl fmt::Display for ChartSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Github(chart) => write!(f, "{}", chart),
            Self::Archive(uri) => write!(f, "{}", uri),
        }
    }
}

/// Chart rendering engine
///
/// `kube_version` may be empty, in which case the engine picks its own
/// default target platform version.
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(
        &self,
        source: ChartSource<'_>,
        values: &str,
        release_name: &str,
        namespace: &str,
        kube_version: &str,
    ) -> Result<Manifests, SourceError>;
}

/// Fetches already-rendered manifests from an archive
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    async fn fetch_manifests(&self, uri: &str) -> Result<Manifests, SourceError>;
}
