use std::path::PathBuf;

use courier::config::{Config, StreamSettings};
use courier::stream::StreamConfig;

#[test]
fn test_config_defaults() {
    let cfg = Config::default();
    assert_eq!(cfg.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.file, PathBuf::from("index.html"));
    assert_eq!(cfg.content_type, "application/octet-stream");
    assert_eq!(cfg.stream.chunk_size, 32 * 1024);
    assert!(!cfg.stream.flush);
}

#[test]
fn test_config_from_yaml() {
    let raw = r#"
listen_addr: 0.0.0.0:3000
file: /srv/video.mp4
content_type: video/mp4
stream:
  chunk_size: 65536
  flush: true
"#;

    let cfg = Config::from_yaml(raw).unwrap();
    assert_eq!(cfg.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.file, PathBuf::from("/srv/video.mp4"));
    assert_eq!(cfg.content_type, "video/mp4");
    assert_eq!(
        cfg.stream,
        StreamSettings {
            chunk_size: 65536,
            flush: true,
        }
    );
}

#[test]
fn test_config_partial_yaml_uses_defaults() {
    let cfg = Config::from_yaml("stream:\n  flush: true\n").unwrap();
    assert_eq!(cfg.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.stream.chunk_size, 32 * 1024);
    assert!(cfg.stream.flush);
}

#[test]
fn test_config_invalid_yaml() {
    assert!(Config::from_yaml("stream: [1, 2").is_err());
    assert!(Config::from_yaml("stream:\n  chunk_size: lots\n").is_err());
}

#[test]
fn test_stream_settings_into_stream_config() {
    let settings = StreamSettings {
        chunk_size: 1024,
        flush: true,
    };
    let config = StreamConfig::from(&settings);
    assert_eq!(config.chunk_size(), 1024);
    assert!(config.flush_after_write());

    let config = StreamConfig::from(&StreamSettings::default());
    assert_eq!(config.chunk_size(), 32 * 1024);
    assert!(!config.flush_after_write());
}

#[test]
fn test_config_load_from_env() {
    let path = std::env::temp_dir().join(format!("courier-config-{}.yaml", std::process::id()));
    std::fs::write(&path, "listen_addr: 127.0.0.1:9000\ncontent_type: text/plain\n").unwrap();

    unsafe {
        std::env::set_var("COURIER_CONFIG", &path);
        std::env::remove_var("LISTEN");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
    assert_eq!(cfg.content_type, "text/plain");

    // LISTEN overrides the file
    unsafe {
        std::env::set_var("LISTEN", "0.0.0.0:5000");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.listen_addr, "0.0.0.0:5000");
    assert_eq!(cfg.content_type, "text/plain");

    unsafe {
        std::env::set_var("COURIER_CONFIG", path.with_extension("missing"));
    }
    assert!(Config::load().is_err());

    unsafe {
        std::env::remove_var("COURIER_CONFIG");
        std::env::remove_var("LISTEN");
    }
    let _ = std::fs::remove_file(&path);
    assert_eq!(Config::load().unwrap().listen_addr, "127.0.0.1:8080");
}
