use clap::Parser;
use tonebox_bridge::config::Args;
use tonebox_core::config::EngineConfig;
use tonebox_test_harness::fixtures::{fixture_dir, write_config};

#[test]
fn test_config_file_then_flags() {
    let dir = fixture_dir();
    let path = write_config(
        dir.path(),
        &EngineConfig {
            grain_seed: 1234,
            reject_unknown_operations: false,
        },
    );
    let path = path.to_str().unwrap();

    let from_file = Args::parse_from(["tonebox", "--config", path])
        .engine_config()
        .unwrap();
    assert_eq!(from_file.grain_seed, 1234);
    assert!(!from_file.reject_unknown_operations);

    let overridden = Args::parse_from(["tonebox", "-c", path, "--strict", "--grain-seed", "5"])
        .engine_config()
        .unwrap();
    assert_eq!(overridden.grain_seed, 5);
    assert!(overridden.reject_unknown_operations);
}

#[test]
fn test_malformed_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ grain_seed: ").unwrap();
    let args = Args::parse_from(["tonebox", "--config", path.to_str().unwrap()]);
    assert!(args.engine_config().is_err());
}
