use std::env;
use std::fs;
use std::path::Path;

use bloom_core::config::{detect_config_path, AppConfig, LoadOptions, LogFormat};
use toml::Value;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    CommandResult { exit_code: 0, output: render(&config) }
}

fn render(config: &AppConfig) -> String {
    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let entries: [(&str, String, &[&str]); 9] = [
        ("storage.backend", config.storage.backend.as_str().to_string(), &["BLOOM_STORAGE_BACKEND"]),
        ("storage.database_url", config.storage.database_url.clone(), &["BLOOM_DATABASE_URL"]),
        (
            "storage.max_connections",
            config.storage.max_connections.to_string(),
            &["BLOOM_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "storage.timeout_secs",
            config.storage.timeout_secs.to_string(),
            &["BLOOM_DATABASE_TIMEOUT_SECS"],
        ),
        ("storage.json_path", config.storage.json_path.display().to_string(), &["BLOOM_JSON_PATH"]),
        ("catalog.box_size", config.catalog.box_size.to_string(), &["BLOOM_BOX_SIZE"]),
        (
            "catalog.default_sort",
            config.catalog.default_sort.as_str().to_string(),
            &["BLOOM_DEFAULT_SORT"],
        ),
        ("logging.level", config.logging.level.clone(), &["BLOOM_LOGGING_LEVEL", "BLOOM_LOG_LEVEL"]),
        (
            "logging.format",
            log_format_name(config.logging.format).to_string(),
            &["BLOOM_LOGGING_FORMAT", "BLOOM_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_keys) in entries {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }
    lines.join("\n")
}

fn log_format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
