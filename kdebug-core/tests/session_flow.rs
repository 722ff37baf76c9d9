//! Full debug-attempt flow against fake external collaborators: a stub
//! cluster CLI and a stub helper binary, each recording its invocations.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kdebug_common::config::Config;
use kdebug_core::debugger::{DebuggerConfig, DebuggerKind};
use kdebug_core::kube::Resolver;
use kdebug_core::session::{self, SessionRequest};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn fake_kubectl(dir: &Path, log: &Path) -> PathBuf {
    let body = format!(
        r#"echo "$@" >> {log}
case "$1" in
  get)
    case "$4" in
      namespaces) printf '%s' '{{"items":[{{"metadata":{{"name":"default"}}}}]}}' ;;
      pods) printf '%s' '{{"items":[{{"metadata":{{"name":"web-0","namespace":"default"}},"spec":{{"nodeName":"node-a","containers":[{{"name":"web","image":"web:1.2"}}]}}}}]}}' ;;
    esac ;;
  port-forward)
    echo "Forwarding from 127.0.0.1:43211 -> 1235"
    exec sleep 30 ;;
esac"#,
        log = log.display()
    );
    write_script(dir, "kubectl", &body)
}

fn fake_helper(dir: &Path, log: &Path) -> PathBuf {
    let body = format!(
        r#"echo "$@" >> {log}
printf '%s\n' '{{"PortForwardCmd":"kubectl port-forward web-0-debug :1235 -n default"}}'"#,
        log = log.display()
    );
    write_script(dir, "kdebugctl", &body)
}

#[tokio::test]
async fn resolve_invoke_tunnel_and_configure() {
    let dir = tempfile::TempDir::new().unwrap();
    let kubectl_log = dir.path().join("kubectl.log");
    let helper_log = dir.path().join("helper.log");
    let kubectl = fake_kubectl(dir.path(), &kubectl_log);
    let helper = fake_helper(dir.path(), &helper_log);

    let config = Config {
        kubectl_path: kubectl.display().to_string(),
        helper_path: Some(helper),
        remote_path: Some("/remote/src".to_string()),
        tunnel_timeout: Duration::from_secs(10),
        ..Config::default()
    };

    // resolve the target
    let resolver = Resolver::new(&config);
    let namespaces = resolver.namespaces().await.unwrap();
    assert_eq!(namespaces.len(), 1);
    let namespace = namespaces[0].metadata.name.clone();

    let pods = resolver.pods(Some(&namespace)).await.unwrap();
    assert_eq!(pods.len(), 1);
    let pod = &pods[0];
    assert_eq!(pod.containers().len(), 1);

    let request = SessionRequest {
        namespace,
        pod: pod.metadata.name.clone(),
        container: pod.containers()[0].name.clone(),
        debugger: DebuggerKind::Dlv,
        local_root: "/local/src".to_string(),
    };

    // helper path override set, so consent must never be asked
    let session = session::attach(&config, &release_fixture(), &request, || {
        panic!("no download should happen with a pre-installed helper")
    })
    .await
    .unwrap();

    assert_eq!(session.local_port(), 43211);
    assert_eq!(session.handle.remote_pod.as_deref(), Some("web-0-debug"));
    assert_eq!(session.handle.remote_namespace.as_deref(), Some("default"));

    match &session.launch {
        DebuggerConfig::DlvLaunch(launch) => {
            assert_eq!(launch.port, 43211);
            assert_eq!(launch.program, "/local/src");
            assert_eq!(launch.remote_path.as_deref(), Some("/remote/src"));
        }
        other => panic!("expected a dlv launch configuration, got {other:?}"),
    }

    // exactly one helper invocation, with the expected argument shape
    let helper_calls = fs::read_to_string(&helper_log).unwrap();
    let helper_calls: Vec<&str> = helper_calls.lines().collect();
    assert_eq!(helper_calls.len(), 1);
    assert_eq!(
        helper_calls[0],
        "--machine --pod web-0 --namespace default --container web --debugger dlv"
    );

    // one invocation per kubectl collaborator role
    let kubectl_calls = fs::read_to_string(&kubectl_log).unwrap();
    let kubectl_calls: Vec<&str> = kubectl_calls.lines().collect();
    assert_eq!(kubectl_calls.len(), 3);
    assert_eq!(kubectl_calls[0], "get -o json namespaces");
    assert_eq!(kubectl_calls[1], "get -o json pods -n default");
    assert_eq!(kubectl_calls[2], "port-forward web-0-debug :1235 -n default");

    session.shutdown().await.unwrap();
}

fn release_fixture() -> kdebug_common::release::HelperRelease {
    kdebug_common::release::HelperRelease::builtin().unwrap()
}
