use super::*;

fn config_for(program: &str) -> DirectoryConfig {
    DirectoryConfig {
        program: program.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_default_config() {
    let config = DirectoryConfig::default();
    assert_eq!(config.program, "container");
    assert_eq!(config.image, "browser:latest");
    assert_eq!(config.command_timeout, Duration::from_secs(10));
}

#[tokio::test]
async fn test_silent_success_is_an_empty_fleet() {
    // `true` exits 0 with no output, the shape of a host with no containers.
    let directory = ContainerDirectory::new(config_for("true"));
    let records = directory.list().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_nonzero_exit_is_reported_with_status() {
    let directory = ContainerDirectory::new(config_for("false"));
    match directory.list().await.unwrap_err() {
        DirectoryError::CommandFailed { status, .. } => assert_eq!(status, 1),
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_binary_is_a_spawn_error() {
    let directory = ContainerDirectory::new(config_for("porthole-no-such-binary"));
    assert!(matches!(
        directory.list().await.unwrap_err(),
        DirectoryError::Spawn(_)
    ));
}

#[tokio::test]
async fn test_non_json_output_is_a_parse_error() {
    // `echo` prints the argument list back, which is not a listing.
    let directory = ContainerDirectory::new(config_for("echo"));
    assert!(matches!(
        directory.list().await.unwrap_err(),
        DirectoryError::Parse(_)
    ));
}
