use medibot_chat::ResponseMode;
use medibot_chat::config::{AppConfig, LogFormat};
use serial_test::serial;
use std::env;
use std::io::Write;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("MEDIBOT_CHAT__ENDPOINT");
        env::remove_var("MEDIBOT_CHAT__TIMEOUT_SECS");
        env::remove_var("MEDIBOT_CHAT__RESPONSE_MODE");
        env::remove_var("MEDIBOT_UI__ASSISTANT_NAME");
        env::remove_var("CONFIG_FILE");
    }
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp config");
    file
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(["medibot-chat"]).expect("defaults should load");

    assert_eq!(config.chat.endpoint, "http://127.0.0.1:8000/chat");
    assert_eq!(config.chat.response_mode, ResponseMode::Auto);
    assert_eq!(config.chat.timeout_secs, 300);
    assert!(config.chat.session_id.is_none());
    assert!(config.chat.greeting.is_none());
    assert_eq!(config.ui.assistant_name, "Medibot");
    assert!(config.ui.color);
    assert_eq!(config.logging.format, LogFormat::Text);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("MEDIBOT_CHAT__ENDPOINT", "http://localhost:9090/chat");
        env::set_var("MEDIBOT_CHAT__RESPONSE_MODE", "json");
        env::set_var("MEDIBOT_UI__ASSISTANT_NAME", "Nurse");
    }

    let config = AppConfig::load_from_args(["medibot-chat"]).expect("Failed to load config");
    assert_eq!(config.chat.endpoint, "http://localhost:9090/chat");
    assert_eq!(config.chat.response_mode, ResponseMode::Json);
    assert_eq!(config.ui.assistant_name, "Nurse");

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let file = write_config(
        r#"
chat:
  endpoint: "http://10.0.0.5:8000/chat"
  greeting: "Hello, I am Medibot."
  session_id: "abc-123"
logging:
  format: json
"#,
    );
    let path = file.path().to_str().unwrap().to_string();

    let config = AppConfig::load_from_args(["medibot-chat", "--config", path.as_str()])
        .expect("Failed to load config from file");
    assert_eq!(config.chat.endpoint, "http://10.0.0.5:8000/chat");
    assert_eq!(config.chat.greeting.as_deref(), Some("Hello, I am Medibot."));
    assert_eq!(config.chat.session_id.as_deref(), Some("abc-123"));
    assert_eq!(config.logging.format, LogFormat::Json);
    // Untouched keys keep their defaults
    assert_eq!(config.chat.timeout_secs, 300);
}

#[test]
#[serial]
fn test_cli_beats_env_beats_file() {
    clear_env_vars();

    let file = write_config(
        r"
chat:
  timeout_secs: 60
  endpoint: http://file.example/chat
",
    );
    unsafe {
        env::set_var("CONFIG_FILE", file.path());
        env::set_var("MEDIBOT_CHAT__TIMEOUT_SECS", "30");
    }

    let config = AppConfig::load_from_args(["medibot-chat", "--timeout-secs", "10", "--no-color"])
        .expect("Failed to load config");
    assert_eq!(config.chat.timeout_secs, 10);
    assert_eq!(config.chat.endpoint, "http://file.example/chat");
    assert!(!config.ui.color);

    let config = AppConfig::load_from_args(["medibot-chat"]).expect("Failed to load config");
    assert_eq!(config.chat.timeout_secs, 30);

    clear_env_vars();
}

#[test]
#[serial]
fn test_invalid_endpoint_is_rejected() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["medibot-chat", "--endpoint", "not a url"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["medibot-chat", "--config", "/nonexistent/medibot.yaml"]);
    assert!(result.is_err());
}
