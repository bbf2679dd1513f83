//! Deployment configuration loading.
//!
//! A deployment is selected on the command line either by file path or by
//! name, in which case `{dir}/{name}.yaml` is read. Relative asset paths in a
//! deployment file are resolved against the file's directory.

use anyhow::{bail, Context, Result};
use gfs_common::Deployment;
use std::path::{Path, PathBuf};

/// Default directory holding deployment YAML files.
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "config/deployments";

/// Load one deployment file.
pub fn load_deployment(path: &Path) -> Result<Deployment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read deployment: {}", path.display()))?;
    let mut deployment = Deployment::from_yaml_str(&content)
        .with_context(|| format!("Failed to parse deployment: {}", path.display()))?;

    if let Some(base) = path.parent() {
        resolve_asset_paths(&mut deployment, base);
    }

    tracing::info!(
        deployment = %deployment.name,
        path = %path.display(),
        markers = deployment.markers.len(),
        "Loaded deployment"
    );
    Ok(deployment)
}

/// Pick the deployment for `selector`: a path to a YAML file, a name looked
/// up in `dir`, or the built-in whole-Indonesia deployment when absent.
pub fn select_deployment(selector: Option<&str>, dir: &Path) -> Result<Deployment> {
    let Some(selector) = selector else {
        tracing::info!("No deployment selected, using built-in 'indonesia'");
        return Ok(Deployment::indonesia());
    };

    let as_path = Path::new(selector);
    if as_path.is_file() {
        return load_deployment(as_path);
    }

    let named = dir.join(format!("{}.yaml", selector));
    if named.is_file() {
        return load_deployment(&named);
    }

    bail!(
        "Deployment '{}' not found (looked for {} and {})",
        selector,
        as_path.display(),
        named.display()
    )
}

/// Load every `.yaml`/`.yml` deployment in `dir`, sorted by file name.
pub fn load_all(dir: &Path) -> Result<Vec<(PathBuf, Deployment)>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("yaml" | "yml")))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| load_deployment(&path).map(|d| (path, d)))
        .collect()
}

fn resolve_asset_paths(deployment: &mut Deployment, base: &Path) {
    let resolve = |p: &mut Option<PathBuf>| {
        if let Some(path) = p.as_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    };
    resolve(&mut deployment.borders_path);
    resolve(&mut deployment.font_path);
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAWA_TIMUR: &str = r#"
name: jawa-timur
region:
  lat_min: -9.0
  lat_max: -6.5
  lon_min: 110.8
  lon_max: 114.8
font_path: fonts/DejaVuSans.ttf
markers:
  - { name: Surabaya, lat: -7.25, lon: 112.75 }
"#;

    #[test]
    fn test_select_builtin_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = select_deployment(None, dir.path()).unwrap();
        assert_eq!(deployment.name, "indonesia");
    }

    #[test]
    fn test_select_by_name_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jawa-timur.yaml");
        std::fs::write(&path, JAWA_TIMUR).unwrap();

        let by_name = select_deployment(Some("jawa-timur"), dir.path()).unwrap();
        assert_eq!(by_name.markers.len(), 1);

        let by_path = select_deployment(path.to_str(), Path::new("/nonexistent")).unwrap();
        assert_eq!(by_path, by_name);
    }

    #[test]
    fn test_relative_assets_resolve_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jawa-timur.yaml");
        std::fs::write(&path, JAWA_TIMUR).unwrap();

        let deployment = load_deployment(&path).unwrap();
        assert_eq!(deployment.font_path, Some(dir.path().join("fonts/DejaVuSans.ttf")));
        assert_eq!(deployment.borders_path, None);
    }

    #[test]
    fn test_unknown_deployment() {
        let dir = tempfile::tempdir().unwrap();
        let err = select_deployment(Some("atlantis"), dir.path()).unwrap_err();
        assert!(err.to_string().contains("atlantis"));
    }

    #[test]
    fn test_invalid_yaml_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "name: [unclosed").unwrap();
        let err = load_deployment(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.yaml"));
    }
}
