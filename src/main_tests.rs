use super::*;

#[test]
fn test_bare_invocation_has_no_subcommand() {
    let cli = Cli::parse_from(["porthole"]);
    assert!(cli.command.is_none());
}

#[test]
fn test_implied_serve_uses_the_documented_defaults() {
    let command = ServeCommand::parse_from(["porthole"]);
    assert_eq!(command.host, "127.0.0.1");
    assert_eq!(command.port, 3000);
    assert_eq!(command.container_cli, "container");
}

#[test]
fn test_implied_serve_honors_env_fallbacks() {
    // SAFETY: no other test in this binary reads or writes PORTHOLE_IMAGE
    unsafe {
        std::env::set_var("PORTHOLE_IMAGE", "chromium:canary");
    }
    let command = ServeCommand::parse_from(["porthole"]);
    unsafe {
        std::env::remove_var("PORTHOLE_IMAGE");
    }
    assert_eq!(command.image, "chromium:canary");
}

#[test]
fn test_serve_flags_beat_env_and_defaults() {
    let cli = Cli::parse_from(["porthole", "serve", "--port", "4100", "--image", "chrome:beta"]);
    match cli.command {
        Some(Commands::Serve(command)) => {
            assert_eq!(command.port, 4100);
            assert_eq!(command.image, "chrome:beta");
            assert_eq!(command.host, "127.0.0.1");
        }
        _ => panic!("expected the serve subcommand"),
    }
}

#[test]
fn test_watch_subcommand_parses_endpoint_flags() {
    let cli = Cli::parse_from(["porthole", "watch", "--host", "10.0.0.7", "--port", "9223"]);
    match cli.command {
        Some(Commands::Watch { host, port }) => {
            assert_eq!(host, "10.0.0.7");
            assert_eq!(port, 9223);
        }
        _ => panic!("expected the watch subcommand"),
    }
}
