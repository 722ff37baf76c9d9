// kdebug-common/src/config.rs
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use super::error::Result;

const DEFAULT_KUBECTL: &str = "kubectl";
const DEFAULT_TUNNEL_TIMEOUT_SECS: u64 = 60;

/// All settings for one debug attempt, constructed once and passed by
/// reference into each component.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-installed helper binary; skips the fetcher entirely when set.
    pub helper_path: Option<PathBuf>,
    /// Kubeconfig handed to every cluster-facing invocation, both as a
    /// `--kubeconfig` flag and as the `KUBECONFIG` environment variable.
    pub kubeconfig: Option<PathBuf>,
    pub kubectl_path: String,
    /// Extra arguments prepended to every helper invocation.
    pub extra_args: Vec<String>,
    /// Pattern forwarded to the helper's `--process-match` flag.
    pub process_match: Option<String>,
    /// Source root used when the target binary was compiled, for source
    /// mapping inside the produced debugger configuration.
    pub remote_path: Option<String>,
    /// Image repository forwarded to the helper's `--container-repo` flag.
    pub container_repository: Option<String>,
    /// Pre-shared secret for python attach configurations.
    pub python_secret: Option<String>,
    /// Root of the local helper binary cache, one subdirectory per version.
    pub install_root: PathBuf,
    /// Upper bound on the wait for the port forward to report its port.
    pub tunnel_timeout: Duration,
    pub verbose: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading kdebug configuration from environment");

        let mut config = Self::default();
        if let Some(path) = env_path("KDEBUG_HELPER_PATH") {
            config.helper_path = Some(path);
        }
        config.kubeconfig = env_path("KDEBUG_KUBECONFIG").or_else(|| env_path("KUBECONFIG"));
        if let Some(kubectl) = env_nonempty("KDEBUG_KUBECTL") {
            config.kubectl_path = kubectl;
        }
        if let Some(extra) = env_nonempty("KDEBUG_EXTRA_ARGS") {
            config.extra_args = extra.split_whitespace().map(str::to_string).collect();
        }
        config.process_match = env_nonempty("KDEBUG_PROCESS_MATCH");
        config.remote_path = env_nonempty("KDEBUG_REMOTE_PATH");
        config.container_repository = env_nonempty("KDEBUG_CONTAINER_REPO");
        config.python_secret = env_nonempty("KDEBUG_PYTHON_SECRET");
        if let Some(root) = env_path("KDEBUG_INSTALL_ROOT") {
            config.install_root = root;
        }
        if let Some(secs) = env_nonempty("KDEBUG_TUNNEL_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => config.tunnel_timeout = Duration::from_secs(secs),
                Err(e) => debug!("Ignoring invalid KDEBUG_TUNNEL_TIMEOUT_SECS '{secs}': {e}"),
            }
        }
        config.verbose = env_nonempty("KDEBUG_VERBOSE").is_some();

        debug!("Effective install root: {}", config.install_root.display());
        Ok(config)
    }

    /// Environment injected into every process that talks to the cluster.
    pub fn cluster_env(&self) -> Vec<(String, String)> {
        match &self.kubeconfig {
            Some(path) => vec![("KUBECONFIG".to_string(), path.display().to_string())],
            None => Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let install_root = dirs::data_dir()
            .unwrap_or_else(env::temp_dir)
            .join("kdebug")
            .join("binaries");
        Self {
            helper_path: None,
            kubeconfig: None,
            kubectl_path: DEFAULT_KUBECTL.to_string(),
            extra_args: Vec::new(),
            process_match: None,
            remote_path: None,
            container_repository: None,
            python_secret: None,
            install_root,
            tunnel_timeout: Duration::from_secs(DEFAULT_TUNNEL_TIMEOUT_SECS),
            verbose: false,
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_nonempty(key).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_self_contained() {
        let config = Config::default();
        assert_eq!(config.kubectl_path, "kubectl");
        assert!(config.extra_args.is_empty());
        assert_eq!(config.tunnel_timeout, Duration::from_secs(60));
        assert!(config.install_root.ends_with("kdebug/binaries"));
    }

    #[test]
    fn cluster_env_only_set_with_kubeconfig() {
        let mut config = Config::default();
        assert!(config.cluster_env().is_empty());

        config.kubeconfig = Some(PathBuf::from("/home/me/.kube/config"));
        assert_eq!(
            config.cluster_env(),
            vec![(
                "KUBECONFIG".to_string(),
                "/home/me/.kube/config".to_string()
            )]
        );
    }
}
