use gluster_stacks::{EtlEngine, LocalStorage, StackConfig, StackError, StackPipeline};
use serde_yaml::Value;
use std::path::Path;
use tempfile::TempDir;

fn config_for(root: &Path) -> StackConfig {
    StackConfig {
        source_dir: root.join("stacks"),
        destination_dir: root.join("prod"),
        log_dir: root.to_path_buf(),
        ..StackConfig::default()
    }
}

fn engine(config: StackConfig) -> EtlEngine<StackPipeline<LocalStorage, StackConfig>> {
    EtlEngine::new(StackPipeline::new(LocalStorage::new(), config).unwrap())
}

fn write_stack(root: &Path, name: &str, content: &str) {
    let dir = root.join("stacks");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), content).unwrap();
}

fn read_output(root: &Path, name: &str) -> String {
    std::fs::read_to_string(root.join("prod").join(name)).unwrap()
}

#[tokio::test]
async fn test_end_to_end_volume_conversion() {
    let temp_dir = TempDir::new().unwrap();
    write_stack(
        temp_dir.path(),
        "app.yml",
        "version: '3.8'\nvolumes: {data1: {driver: local}}\n",
    );

    let summary = engine(config_for(temp_dir.path())).run().await.unwrap();
    assert_eq!(summary.discovered, 1);
    assert!(summary.failed.is_empty());

    let output = read_output(temp_dir.path(), "app.yml");
    let document: Value = serde_yaml::from_str(&output).unwrap();
    let data1 = &document["volumes"]["data1"];

    assert_eq!(data1["driver"], Value::from("glusterfs"));
    assert_eq!(
        data1["driver_opts"]["voluri"],
        Value::from(
            "172.30.230.1:/data/gluster,172.30.230.2:/data/gluster,172.30.230.3:/data/gluster"
        )
    );
    assert_eq!(data1["driver_opts"]["replicate"], Value::from("3"));
    assert_eq!(data1["driver_opts"]["read-only"], Value::from("false"));
    assert!(output.starts_with("# Dynamic Values in this file:\n# None found\nversion: '3.8'\n"));
}

#[tokio::test]
async fn test_invalid_volume_name_is_left_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let stack = "volumes:\n  .scratch:\n    driver: local\n    driver_opts:\n      type: tmpfs\n  data:\n    driver: local\n";
    write_stack(temp_dir.path(), "scratch.yml", stack);

    engine(config_for(temp_dir.path())).run().await.unwrap();

    let output = read_output(temp_dir.path(), "scratch.yml");
    assert!(output.contains("  .scratch:\n    driver: local\n    driver_opts:\n      type: tmpfs\n"));

    let document: Value = serde_yaml::from_str(&output).unwrap();
    assert_eq!(document["volumes"][".scratch"]["driver"], Value::from("local"));
    assert_eq!(document["volumes"]["data"]["driver"], Value::from("glusterfs"));
}

#[tokio::test]
async fn test_missing_source_directory_aborts_without_output() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(temp_dir.path());

    let err = engine(config).run().await.unwrap_err();

    assert!(matches!(err, StackError::DirectoryNotFound { .. }));
    assert!(!temp_dir.path().join("prod").exists());
}

#[tokio::test]
async fn test_broken_file_does_not_stop_the_run() {
    let temp_dir = TempDir::new().unwrap();
    write_stack(temp_dir.path(), "a-broken.yml", "services: [web\n");
    write_stack(temp_dir.path(), "b-good.yml", "volumes:\n  logs:\n");
    write_stack(temp_dir.path(), "ignored.yaml", "volumes:\n  logs:\n");

    let summary = engine(config_for(temp_dir.path())).run().await.unwrap();

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.failed, vec![temp_dir.path().join("stacks").join("a-broken.yml")]);
    assert!(!temp_dir.path().join("prod").join("a-broken.yml").exists());
    assert!(read_output(temp_dir.path(), "b-good.yml").contains("driver: glusterfs"));
    assert!(!temp_dir.path().join("prod").join("ignored.yaml").exists());
}

#[tokio::test]
async fn test_second_run_is_stable() {
    let temp_dir = TempDir::new().unwrap();
    let stack = r#"# Monitoring stack
version: "3.8"
services:
  grafana:
    image: grafana/grafana:${GRAFANA_VERSION}
    secrets:
      - admin_password
volumes:
  grafana-data:
    driver: local
    driver_opts:
      o: bind
secrets:
  admin_password:
    external: true
"#;
    write_stack(temp_dir.path(), "monitoring.yml", stack);

    engine(config_for(temp_dir.path())).run().await.unwrap();
    let first = read_output(temp_dir.path(), "monitoring.yml");

    // feed the output back in as the next run's input
    write_stack(temp_dir.path(), "monitoring.yml", &first);
    engine(config_for(temp_dir.path())).run().await.unwrap();
    let second = read_output(temp_dir.path(), "monitoring.yml");

    assert_eq!(first, second);
    assert_eq!(first.matches("# Dynamic Values in this file:").count(), 1);
    assert!(first.starts_with(
        "# Monitoring stack\n# Dynamic Values in this file:\n# - ${GRAFANA_VERSION}\n# - secrets\n"
    ));

    let document: Value = serde_yaml::from_str(&second).unwrap();
    assert_eq!(
        document["volumes"]["grafana-data"]["driver_opts"]["o"],
        Value::from("bind")
    );
}

#[tokio::test]
async fn test_document_without_volumes_only_gets_annotated() {
    let temp_dir = TempDir::new().unwrap();
    let stack = "networks:\n  edge:\n    driver: overlay   # swarm only\nservices:\n  proxy:\n    image: 'traefik:v3'\n";
    write_stack(temp_dir.path(), "edge.yml", stack);

    engine(config_for(temp_dir.path())).run().await.unwrap();

    assert_eq!(
        read_output(temp_dir.path(), "edge.yml"),
        "# Dynamic Values in this file:\n# None found\nservices:\n  proxy:\n    image: 'traefik:v3'\nnetworks:\n  edge:\n    driver: overlay   # swarm only\n"
    );
}

#[tokio::test]
async fn test_strict_volume_names() {
    let temp_dir = TempDir::new().unwrap();
    write_stack(temp_dir.path(), "strict.yml", "volumes:\n  data.v1:\n  data-v2:\n");

    let mut config = config_for(temp_dir.path());
    config.gluster.strict_volume_names = true;
    engine(config).run().await.unwrap();

    let document: Value =
        serde_yaml::from_str(&read_output(temp_dir.path(), "strict.yml")).unwrap();
    assert_eq!(document["volumes"]["data.v1"], Value::Null);
    assert_eq!(document["volumes"]["data-v2"]["driver"], Value::from("glusterfs"));
}

#[tokio::test]
async fn test_anchor_defined_after_reordered_alias() {
    let temp_dir = TempDir::new().unwrap();
    write_stack(
        temp_dir.path(),
        "a.yml",
        "x-logging: &default-logging\n  driver: json-file\nservices:\n  web:\n    image: nginx\n    logging: *default-logging\nversion: '3.8'\n",
    );

    let summary = engine(config_for(temp_dir.path())).run().await.unwrap();
    assert!(summary.failed.is_empty());

    let output = read_output(temp_dir.path(), "a.yml");
    let document: Value = serde_yaml::from_str(&output).unwrap();
    assert_eq!(
        document["services"]["web"]["logging"]["driver"],
        Value::from("json-file")
    );
    assert_eq!(document["x-logging"]["driver"], Value::from("json-file"));
    assert!(output.find("&default-logging").unwrap() < output.find("*default-logging").unwrap());
}

#[tokio::test]
async fn test_crlf_file_keeps_its_line_endings() {
    let temp_dir = TempDir::new().unwrap();
    write_stack(
        temp_dir.path(),
        "win.yml",
        "# edited on windows\r\nvolumes:\r\n  data:\r\n    driver: local\r\nversion: '3.8'\r\n",
    );

    engine(config_for(temp_dir.path())).run().await.unwrap();

    let output = read_output(temp_dir.path(), "win.yml");
    assert!(output.starts_with(
        "# edited on windows\r\n# Dynamic Values in this file:\r\n# None found\r\nversion: '3.8'\r\nvolumes:\r\n  data:\r\n    driver: glusterfs\r\n"
    ));
    assert!(output.ends_with("\r\n"));
    assert_eq!(output.matches('\n').count(), output.matches("\r\n").count());
}
