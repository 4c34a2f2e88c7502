use std::path::Path;

use serde_json::Value as Json;
use strum::IntoEnumIterator;
use tokio::fs;
use tracing::instrument;

use super::DevService;
use crate::{
    errors::{Result, UserFacingError},
    model::{Dependency, ManifestKind},
};

/// Keys of the `package.json` holding dependency maps
const PACKAGE_JSON_KEYS: [&str; 2] = ["dependencies", "devDependencies"];

/// Dependencies found on the manifests of a directory
#[derive(Debug, Default)]
pub struct ManifestScan {
    /// Manifests successfully parsed
    pub manifests: Vec<ManifestKind>,
    /// Dependencies of every parsed manifest, in order
    pub dependencies: Vec<Dependency>,
    /// Manifests that couldn't be parsed
    pub errors: Vec<ManifestError>,
}

/// A manifest that couldn't be read or parsed
#[derive(Debug, PartialEq, Eq)]
pub struct ManifestError {
    pub kind: ManifestKind,
    pub message: String,
}

impl DevService {
    /// Reads every known dependency manifest on the given directory.
    ///
    /// A manifest failing to parse doesn't prevent the others from being read.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub async fn scan_manifests(&self, dir: impl AsRef<Path>) -> Result<ManifestScan> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(UserFacingError::NotADirectory(dir.display().to_string()).into());
        }

        let mut scan = ManifestScan::default();
        for kind in ManifestKind::iter() {
            let path = dir.join(kind.file_name());
            if !path.is_file() {
                tracing::debug!("No {kind} found");
                continue;
            }
            let parsed = match fs::read_to_string(&path).await {
                Ok(content) => match kind {
                    ManifestKind::PackageJson => parse_package_json(&content),
                    ManifestKind::Requirements => Ok(parse_requirements(&content)),
                },
                Err(err) => Err(format!("couldn't read file: {err}")),
            };
            match parsed {
                Ok(deps) => {
                    tracing::info!("Found {} dependencies on {kind}", deps.len());
                    scan.manifests.push(kind);
                    scan.dependencies.extend(deps);
                }
                Err(message) => {
                    tracing::warn!("Couldn't parse {kind}: {message}");
                    scan.errors.push(ManifestError { kind, message });
                }
            }
        }
        Ok(scan)
    }
}

/// Parses the `dependencies` and `devDependencies` maps of a `package.json`
fn parse_package_json(content: &str) -> Result<Vec<Dependency>, String> {
    let json: Json = serde_json::from_str(content).map_err(|err| format!("invalid json: {err}"))?;
    let root = json.as_object().ok_or("expected a json object")?;
    let mut deps = Vec::new();
    for key in PACKAGE_JSON_KEYS {
        let Some(map) = root.get(key) else {
            continue;
        };
        let map = map.as_object().ok_or_else(|| format!("'{key}' is not an object"))?;
        deps.extend(map.iter().map(|(name, version)| {
            let version = match version {
                Json::String(version) => version.clone(),
                other => other.to_string(),
            };
            Dependency::new(name, Some(version))
        }));
    }
    Ok(deps)
}

/// Parses a requirements list, pinned versions (`name==version`) are split and anything else is kept verbatim
fn parse_requirements(content: &str) -> Vec<Dependency> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once("==") {
            Some((name, version)) => Dependency::new(name.trim(), Some(version.trim())),
            None => Dependency::new(line, None::<String>),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::{AiConfig, ScanConfig};

    fn service() -> DevService {
        DevService::new(AiConfig::default(), ScanConfig::default())
    }

    #[test]
    fn test_parse_package_json() {
        let deps = parse_package_json(
            r#"{
                "name": "app",
                "dependencies": { "express": "3.0.0", "lodash": "4.17.4" },
                "devDependencies": { "jest": "^29.0.0" }
            }"#,
        )
        .unwrap();
        assert_eq!(
            deps.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["express@3.0.0", "lodash@4.17.4", "jest@^29.0.0"]
        );
        assert_eq!(parse_package_json(r#"{"name": "empty"}"#), Ok(vec![]));
        assert!(parse_package_json("{").is_err());
        assert!(parse_package_json(r#"{"dependencies": []}"#).is_err());
    }

    #[test]
    fn test_parse_requirements() {
        let deps = parse_requirements("# comment\n\nrequests==2.19.0\nflask>=1.0\n  django == 1.11  \n");
        assert_eq!(
            deps.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["requests@2.19.0", "flask>=1.0", "django@1.11"]
        );
    }

    #[tokio::test]
    async fn test_scan_manifests() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"lodash": "4.17.4", "express": "3.0.0"}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "pyyaml==5.3\n").unwrap();

        let scan = service().scan_manifests(dir.path()).await.unwrap();
        assert_eq!(scan.manifests, vec![ManifestKind::PackageJson, ManifestKind::Requirements]);
        assert_eq!(
            scan.dependencies.iter().join(", "),
            "express@3.0.0, lodash@4.17.4, pyyaml@5.3"
        );
        assert!(scan.errors.is_empty());
    }

    #[tokio::test]
    async fn test_scan_manifests_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "numpy==1.0\n").unwrap();

        let scan = service().scan_manifests(dir.path()).await.unwrap();
        assert_eq!(scan.manifests, vec![ManifestKind::Requirements]);
        assert_eq!(scan.dependencies, vec![Dependency::new("numpy", Some("1.0"))]);
        assert_eq!(scan.errors.len(), 1);
        assert_eq!(scan.errors[0].kind, ManifestKind::PackageJson);
    }

    #[tokio::test]
    async fn test_scan_manifests_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let scan = service().scan_manifests(dir.path()).await.unwrap();
        assert!(scan.manifests.is_empty());
        assert!(scan.dependencies.is_empty());
    }
}
