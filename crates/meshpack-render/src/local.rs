//! Local filesystem implementations of the source collaborators
//!
//! [`LocalChartRenderer`] renders chart directories and packaged `.tgz`
//! charts with the MiniJinja [`Engine`]. [`LocalArchiveFetcher`] reads the
//! YAML files of a local manifests archive. Neither performs network access:
//! GitHub references and remote URIs are reported as unsupported.

use async_trait::async_trait;
use meshpack_core::{Manifest, Manifests, Values, archive};
use serde_json::json;
use std::path::{Path, PathBuf};
use url::Url;

use crate::engine::Engine;
use crate::error::SourceError;
use crate::sources::{ArchiveFetcher, ChartRenderer, ChartSource};

/// Kubernetes version exposed to charts when the caller passes none
pub const DEFAULT_KUBE_VERSION: &str = "v1.28.0";

const VALUES_FILE: &str = "values.yaml";

const TEMPLATE_EXTENSIONS: &[&str] = &["yaml", "yml", "tpl", "j2", "txt", "json"];

/// Renders local charts with the built-in template engine
#[derive(Debug, Clone, Default)]
pub struct LocalChartRenderer {
    engine: Engine,
}

impl LocalChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(engine: Engine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ChartRenderer for LocalChartRenderer {
    async fn render(
        &self,
        source: ChartSource<'_>,
        values: &str,
        release_name: &str,
        namespace: &str,
        kube_version: &str,
    ) -> Result<Manifests, SourceError> {
        let uri = match source {
            ChartSource::Github(chart) => {
                return Err(SourceError::Unsupported {
                    source_ref: chart.to_string(),
                    reason: "GitHub charts require a remote chart renderer".to_string(),
                });
            }
            ChartSource::Archive(uri) => uri,
        };

        let files = ChartFiles::load(&resolve_local_path(uri)?)?;

        let mut chart_values = Values::from_yaml(files.values.as_deref().unwrap_or_default())?;
        chart_values.merge(&Values::from_yaml(values)?);

        let kube_version = if kube_version.is_empty() {
            DEFAULT_KUBE_VERSION
        } else {
            kube_version
        };
        let context = json!({
            "values": chart_values.inner(),
            "release": {
                "name": release_name,
                "namespace": namespace,
            },
            "capabilities": {
                "kubeVersion": kube_version,
            },
        });

        let rendered = self.engine.render_templates(&files.templates, &context)?;

        Ok(rendered
            .into_iter()
            .filter(|(_, content)| !content.trim().is_empty())
            .map(|(name, content)| Manifest::new(name, content))
            .collect::<Vec<_>>()
            .into())
    }
}

/// Reads manifests from local `.tar.gz` archives
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalArchiveFetcher;

#[async_trait]
impl ArchiveFetcher for LocalArchiveFetcher {
    async fn fetch_manifests(&self, uri: &str) -> Result<Manifests, SourceError> {
        let path = resolve_local_path(uri)?;
        Ok(archive::read_manifests(&path)?)
    }
}

/// Map a plain path or `file://` URI to an existing local path
pub fn resolve_local_path(uri: &str) -> Result<PathBuf, SourceError> {
    let path = if uri.contains("://") {
        let url = Url::parse(uri).map_err(|e| SourceError::Unsupported {
            source_ref: uri.to_string(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "file" {
            return Err(SourceError::Unsupported {
                source_ref: uri.to_string(),
                reason: format!("'{}' sources are not available locally", url.scheme()),
            });
        }
        url.to_file_path().map_err(|()| SourceError::Unsupported {
            source_ref: uri.to_string(),
            reason: "not a local file path".to_string(),
        })?
    } else {
        PathBuf::from(uri)
    };

    if !path.exists() {
        return Err(SourceError::NotFound {
            path: path.display().to_string(),
        });
    }

    Ok(path)
}

/// The renderable parts of a chart, with chart-relative paths
struct ChartFiles {
    values: Option<String>,
    /// `(templates/..., source)` sorted by path
    templates: Vec<(String, String)>,
}

impl ChartFiles {
    fn load(path: &Path) -> Result<Self, SourceError> {
        let files = if path.is_dir() {
            read_dir_files(path)?
        } else {
            read_archive_files(path)?
        };

        let mut values = None;
        let mut templates = Vec::new();
        for (name, content) in files {
            if name == VALUES_FILE {
                values = Some(content);
            } else {
                templates.push((name, content));
            }
        }
        templates.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(Self { values, templates })
    }
}

/// Only these files are decoded; anything else in a chart may be binary
fn is_chart_text(name: &str) -> bool {
    name == VALUES_FILE || is_template(name)
}

fn is_template(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("templates/") else {
        return false;
    };
    if rest.ends_with("NOTES.txt") {
        return false;
    }
    rest.rsplit_once('.')
        .is_some_and(|(_, ext)| TEMPLATE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn read_dir_files(root: &Path) -> Result<Vec<(String, String)>, SourceError> {
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if !is_chart_text(&name) {
            continue;
        }
        files.push((name, std::fs::read_to_string(path)?));
    }

    Ok(files)
}

/// Packaged charts nest everything under one `<chart>/` directory; strip it
fn read_archive_files(path: &Path) -> Result<Vec<(String, String)>, SourceError> {
    let entries = archive::read_entries(path)?;

    let root = entries
        .first()
        .and_then(|e| e.path.split_once('/'))
        .map(|(dir, _)| format!("{}/", dir))
        .filter(|prefix| entries.iter().all(|e| e.path.starts_with(prefix.as_str())));

    let mut files = Vec::new();
    for entry in &entries {
        let name = root
            .as_deref()
            .and_then(|prefix| entry.path.strip_prefix(prefix))
            .unwrap_or(entry.path.as_str());
        if !is_chart_text(name) {
            continue;
        }
        files.push((name.to_string(), entry.text()?.to_string()));
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use meshpack_core::GithubChartRef;
    use std::fs;

    fn write_chart(dir: &Path) {
        fs::create_dir_all(dir.join("templates")).unwrap();
        fs::write(dir.join("Chart.yaml"), "name: web\nversion: 0.1.0\n").unwrap();
        fs::write(dir.join("values.yaml"), "replicas: 1\nimage: web:v1\n").unwrap();
        fs::write(
            dir.join("templates/_helpers.tpl"),
            "{{ release.name }}-web",
        )
        .unwrap();
        fs::write(
            dir.join("templates/deployment.yaml"),
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: {% include \"templates/_helpers.tpl\" %}\n  namespace: {{ release.namespace }}\nspec:\n  replicas: {{ values.replicas }}\n",
        )
        .unwrap();
        fs::write(
            dir.join("templates/service.yaml"),
            "{% if values.service is defined %}kind: Service\n{% endif %}",
        )
        .unwrap();
        fs::write(dir.join("templates/NOTES.txt"), "{{ nope }}").unwrap();
    }

    fn tgz(path: &Path, files: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, content.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[tokio::test]
    async fn test_render_chart_directory() {
        let temp = tempfile::tempdir().unwrap();
        write_chart(temp.path());
        let uri = temp.path().to_string_lossy().to_string();

        let manifests = LocalChartRenderer::new()
            .render(ChartSource::Archive(&uri), "replicas: 3\n", "demo", "app", "")
            .await
            .unwrap();

        assert_eq!(manifests.len(), 1);
        let manifest = manifests.iter().next().unwrap();
        assert_eq!(manifest.name, "templates/deployment.yaml");
        assert!(manifest.content.contains("name: demo-web"));
        assert!(manifest.content.contains("namespace: app"));
        assert!(manifest.content.contains("replicas: 3"));
    }

    #[tokio::test]
    async fn test_render_packaged_chart_from_file_uri() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("web-0.1.0.tgz");
        tgz(
            &archive,
            &[
                ("web/Chart.yaml", "name: web\n"),
                ("web/values.yaml", "port: 80\n"),
                (
                    "web/templates/svc.yaml",
                    "kind: Service\nport: {{ values.port }}\nkube: {{ capabilities.kubeVersion }}\n",
                ),
            ],
        );
        let uri = Url::from_file_path(&archive).unwrap().to_string();

        let manifests = LocalChartRenderer::new()
            .render(ChartSource::Archive(&uri), "", "demo", "app", "v1.30.1")
            .await
            .unwrap();

        let manifest = manifests.iter().next().unwrap();
        assert_eq!(manifest.name, "templates/svc.yaml");
        assert_eq!(manifest.content, "kind: Service\nport: 80\nkube: v1.30.1\n");
    }

    #[tokio::test]
    async fn test_packaged_chart_with_binary_entries() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("demo-0.1.0.tgz");
        let file = fs::File::create(&archive).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        let entries: [(&str, &[u8]); 3] = [
            ("demo/templates/cm.yaml", b"kind: ConfigMap\n"),
            ("demo/charts/sub-0.1.0.tgz", &[0x1f, 0x8b, 0x08, 0x00, 0xff, 0xfe]),
            ("demo/icon.png", &[0x89, 0x50, 0x4e, 0x47, 0xff]),
        ];
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, content).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();

        let manifests = LocalChartRenderer::new()
            .render(ChartSource::Archive(&archive.to_string_lossy()), "", "demo", "app", "")
            .await
            .unwrap();

        let names: Vec<&str> = manifests.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["templates/cm.yaml"]);
    }

    #[tokio::test]
    async fn test_chart_directory_with_binary_files() {
        let temp = tempfile::tempdir().unwrap();
        write_chart(temp.path());
        fs::create_dir_all(temp.path().join("charts")).unwrap();
        fs::write(temp.path().join("charts/sub-0.1.0.tgz"), [0x1f, 0x8b, 0xff, 0xfe]).unwrap();
        let uri = temp.path().to_string_lossy().to_string();

        let manifests = LocalChartRenderer::new()
            .render(ChartSource::Archive(&uri), "", "demo", "app", "")
            .await
            .unwrap();

        assert_eq!(manifests.len(), 1);
    }

    #[tokio::test]
    async fn test_default_kube_version() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("templates")).unwrap();
        fs::write(
            temp.path().join("templates/cm.yaml"),
            "kube: {{ capabilities.kubeVersion }}",
        )
        .unwrap();
        let uri = temp.path().to_string_lossy().to_string();

        let manifests = LocalChartRenderer::new()
            .render(ChartSource::Archive(&uri), "", "demo", "app", "")
            .await
            .unwrap();

        assert_eq!(manifests.iter().next().unwrap().content, "kube: v1.28.0");
    }

    #[tokio::test]
    async fn test_template_error_surfaces() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("templates")).unwrap();
        fs::write(temp.path().join("templates/bad.yaml"), "x: {{ values.missing.key }}").unwrap();
        let uri = temp.path().to_string_lossy().to_string();

        let err = LocalChartRenderer::new()
            .render(ChartSource::Archive(&uri), "", "demo", "app", "")
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Template(_)));
    }

    #[tokio::test]
    async fn test_github_unsupported() {
        let chart = GithubChartRef {
            org: "solo-io".into(),
            repo: "charts".into(),
            git_ref: "main".into(),
            directory: "web".into(),
        };

        let err = LocalChartRenderer::new()
            .render(ChartSource::Github(&chart), "", "demo", "app", "")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SourceError::Unsupported { ref source_ref, .. } if source_ref == "github.com/solo-io/charts@main:web"
        ));
    }

    #[tokio::test]
    async fn test_fetch_manifests_archive() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("crds.tar.gz");
        tgz(
            &archive,
            &[
                ("b.yaml", "kind: B\n"),
                ("README.md", "docs"),
                ("a.yml", "kind: A\n"),
            ],
        );

        let manifests = LocalArchiveFetcher
            .fetch_manifests(&archive.to_string_lossy())
            .await
            .unwrap();

        let names: Vec<&str> = manifests.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["b.yaml", "a.yml"]);
    }

    #[test]
    fn test_resolve_local_path() {
        let temp = tempfile::tempdir().unwrap();
        let uri = Url::from_directory_path(temp.path()).unwrap().to_string();
        assert!(resolve_local_path(&uri).unwrap().is_dir());

        assert!(matches!(
            resolve_local_path("https://example.com/chart.tgz"),
            Err(SourceError::Unsupported { .. })
        ));
        assert!(matches!(
            resolve_local_path("/nonexistent/chart.tgz"),
            Err(SourceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_is_template() {
        assert!(is_template("templates/deployment.yaml"));
        assert!(is_template("templates/sub/_helpers.tpl"));
        assert!(!is_template("templates/NOTES.txt"));
        assert!(!is_template("values.yaml"));
        assert!(!is_template("templates/logo.png"));
        assert!(is_chart_text("values.yaml"));
        assert!(!is_chart_text("charts/sub-0.1.0.tgz"));
    }
}
