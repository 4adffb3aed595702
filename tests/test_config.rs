use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use segaline::config::Config;

#[test]
fn test_config_defaults() {
    let cfg = Config::from_yaml("{}").unwrap();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:1440");
    assert_eq!(cfg.server.read_timeout_secs, 10);
    assert_eq!(cfg.server.name, "Segaline");
    assert_eq!(cfg.static_files.root, PathBuf::from("./public"));
    assert_eq!(cfg.static_files.template_root, PathBuf::from("./templates"));
}

#[test]
fn test_config_partial_yaml_keeps_other_defaults() {
    let cfg = Config::from_yaml(
        r#"
server:
  read_timeout_secs: 3
static_files:
  root: /srv/www
"#,
    )
    .unwrap();

    assert_eq!(cfg.server.read_timeout_secs, 3);
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:1440");
    assert_eq!(cfg.static_files.root, PathBuf::from("/srv/www"));
    assert_eq!(cfg.static_files.template_root, PathBuf::from("./templates"));
}

#[test]
fn test_config_rejects_bad_yaml() {
    assert!(Config::from_yaml("server: [1, 2").is_err());
    assert!(Config::from_yaml("server:\n  read_timeout_secs: soon\n").is_err());
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::from_yaml("server:\n  name: Edge\n").unwrap();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.server.name, cfg2.server.name);
}

#[test]
fn test_server_identity_and_settings() {
    let cfg = Config::from_yaml("server:\n  name: Edge\n  read_timeout_secs: 7\n").unwrap();

    let identity = format!("Edge/{}", env!("CARGO_PKG_VERSION"));
    assert_eq!(cfg.server_identity(), identity);

    let settings = cfg.connection_settings();
    assert_eq!(settings.read_timeout, Duration::from_secs(7));
    assert_eq!(&*settings.server_identity, identity);
}

#[test]
fn test_config_from_missing_file() {
    let err = Config::from_file(std::path::Path::new("/nonexistent/segaline.yaml")).unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
}

// Everything touching LISTEN lives in one test so parallel tests never see
// each other's environment.
#[test]
fn test_config_listen_from_env() {
    unsafe {
        std::env::remove_var("LISTEN");
    }
    assert_eq!(Config::load().server.listen_addr, "0.0.0.0:1440");

    unsafe {
        std::env::set_var("LISTEN", "127.0.0.1:8000");
    }
    let cfg = Config::load();
    assert!(cfg.server.listen_addr.contains("127.0.0.1"));
    assert!(cfg.server.listen_addr.contains("8000"));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "server:\n  listen_addr: 0.0.0.0:5000").unwrap();
    let cfg = Config::from_file(file.path()).unwrap();
    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8000");

    unsafe {
        std::env::remove_var("LISTEN");
    }
    let cfg = Config::from_file(file.path()).unwrap();
    assert!(cfg.server.listen_addr.starts_with("0.0.0.0"));
}
