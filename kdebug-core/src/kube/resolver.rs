// kdebug-core/src/kube/resolver.rs
use kdebug_common::config::Config;
use kdebug_common::error::{KdebugError, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::model::{Namespace, NamespaceList, Pod, PodList};
use crate::exec;

/// Live cluster lookups through the external cluster CLI. Results are
/// point-in-time snapshots; nothing is cached between calls.
pub struct Resolver<'a> {
    config: &'a Config,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub async fn namespaces(&self) -> Result<Vec<Namespace>> {
        let list: NamespaceList = self.get_json(&["namespaces"]).await?;
        Ok(list.items)
    }

    /// Pods in one namespace, or across all namespaces when `None`.
    pub async fn pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>> {
        let list: PodList = match namespace {
            Some(ns) => self.get_json(&["pods", "-n", ns]).await?,
            None => self.get_json(&["pods", "--all-namespaces"]).await?,
        };
        Ok(list.items)
    }

    async fn get_json<T: DeserializeOwned>(&self, resource: &[&str]) -> Result<T> {
        let mut args: Vec<String> = Vec::new();
        if let Some(kubeconfig) = &self.config.kubeconfig {
            args.push(format!("--kubeconfig={}", kubeconfig.display()));
        }
        args.extend(["get", "-o", "json"].map(String::from));
        args.extend(resource.iter().map(|s| s.to_string()));

        debug!("Resolving cluster resources: {} {:?}", self.config.kubectl_path, args);
        let out = exec::run(&self.config.kubectl_path, &args, &self.config.cluster_env())
            .await
            .map_err(|e| match e {
                KdebugError::Process {
                    code,
                    stdout: _,
                    stderr,
                } => KdebugError::Resolution {
                    reason: format!(
                        "{} exited with code {code}: {}",
                        self.config.kubectl_path,
                        stderr.trim()
                    ),
                    stderr,
                },
                other => other,
            })?;

        serde_json::from_str(&out.stdout).map_err(|e| KdebugError::Resolution {
            reason: format!("could not decode {} output: {e}", self.config.kubectl_path),
            stderr: out.stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    fn fake_kubectl(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("kubectl");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn config_with(kubectl: &PathBuf) -> Config {
        Config {
            kubectl_path: kubectl.display().to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn namespaces_are_decoded() {
        let dir = TempDir::new().unwrap();
        let kubectl = fake_kubectl(
            &dir,
            r#"printf '%s' '{"items":[{"metadata":{"name":"default"}}]}'"#,
        );
        let config = config_with(&kubectl);

        let namespaces = Resolver::new(&config).namespaces().await.unwrap();
        assert_eq!(namespaces.len(), 1);
        assert_eq!(namespaces[0].metadata.name, "default");
    }

    #[tokio::test]
    async fn namespace_argument_is_passed_verbatim() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("args.log");
        let kubectl = fake_kubectl(
            &dir,
            &format!(
                "echo \"$@\" > {}\nprintf '%s' '{{\"items\":[]}}'",
                log.display()
            ),
        );
        let config = config_with(&kubectl);

        Resolver::new(&config)
            .pods(Some("my-weird.ns"))
            .await
            .unwrap();
        let recorded = fs::read_to_string(&log).unwrap();
        assert_eq!(recorded.trim(), "get -o json pods -n my-weird.ns");
    }

    #[tokio::test]
    async fn failed_query_carries_stderr() {
        let dir = TempDir::new().unwrap();
        let kubectl = fake_kubectl(&dir, "echo 'connection refused' >&2; exit 1");
        let config = config_with(&kubectl);

        let err = Resolver::new(&config).namespaces().await.unwrap_err();
        match err {
            KdebugError::Resolution { reason, stderr } => {
                assert!(reason.contains("exited with code 1"));
                assert_eq!(stderr.trim(), "connection refused");
            }
            other => panic!("expected Resolution error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_resolution_error() {
        let dir = TempDir::new().unwrap();
        let kubectl = fake_kubectl(&dir, "echo 'not json at all'");
        let config = config_with(&kubectl);

        let err = Resolver::new(&config).namespaces().await.unwrap_err();
        assert!(matches!(err, KdebugError::Resolution { .. }));
    }
}
