pub mod browse;
pub mod cart;
pub mod config;
pub mod doctor;
pub mod migrate;
pub mod product;
pub mod quiz;
pub mod recommend;
pub mod review;
pub mod seed;

use bloom_core::config::{AppConfig, LoadOptions};
use bloom_core::errors::{ApplicationError, InterfaceError};
use bloom_db::{open_stores, RepositoryError, Stores};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    fn from_failure(command: &str, failure: Failure) -> Self {
        Self::failure(command, failure.error_class, failure.message, failure.exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// A command that stopped early, carrying its error class and exit code.
#[derive(Debug)]
pub(crate) struct Failure {
    error_class: &'static str,
    message: String,
    exit_code: u8,
}

impl Failure {
    pub(crate) fn new(error_class: &'static str, message: impl Into<String>, exit_code: u8) -> Self {
        Self { error_class, message: message.into(), exit_code }
    }

    pub(crate) fn storage_connect(error: RepositoryError) -> Self {
        Self::new("storage_connect", format!("failed to open storage: {error}"), 4)
    }

    /// Classifies a store error the way the storefront surfaces it.
    pub(crate) fn from_application(command: &str, error: ApplicationError) -> Self {
        let exit_code = match error {
            ApplicationError::Domain(_) | ApplicationError::NotFound(_) => 6,
            ApplicationError::Persistence(_) => 5,
            ApplicationError::Configuration(_) => 2,
        };
        let interface = error.into_interface(command);
        let error_class = match interface {
            InterfaceError::BadRequest { .. } => "bad_request",
            InterfaceError::NotFound { .. } => "not_found",
            InterfaceError::ServiceUnavailable { .. } => "storage_operation",
            InterfaceError::Internal { .. } => "internal",
        };
        Self::new(error_class, interface.to_string(), exit_code)
    }
}

/// Loads configuration and builds the single-threaded runtime every command
/// runs on.
pub(crate) fn prepare(command: &str) -> Result<(AppConfig, tokio::runtime::Runtime), CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })?;

    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            )
        })?;

    Ok((config, runtime))
}

/// Runs `body` against the configured stores and renders its outcome.
pub(crate) fn with_stores<F, Fut>(command: &str, body: F) -> CommandResult
where
    F: FnOnce(AppConfig, Stores) -> Fut,
    Fut: std::future::Future<Output = Result<CommandResult, Failure>>,
{
    let (config, runtime) = match prepare(command) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let outcome = runtime.block_on(async {
        let stores = open_stores(&config.storage).await.map_err(Failure::storage_connect)?;
        let pool = stores.pool().cloned();
        let outcome = body(config, stores).await;
        if let Some(pool) = pool {
            pool.close().await;
        }
        outcome
    });

    outcome.unwrap_or_else(|failure| {
        tracing::warn!(
            event_name = "cli.command.failed",
            command,
            error_class = failure.error_class,
            exit_code = failure.exit_code,
            "{}",
            failure.message
        );
        CommandResult::from_failure(command, failure)
    })
}

/// Adapter for `map_err` on store calls.
pub(crate) fn store_error(command: &'static str) -> impl Fn(RepositoryError) -> Failure {
    move |error| Failure::from_application(command, ApplicationError::from(error))
}

pub(crate) fn to_data(value: impl Serialize) -> Result<Option<Value>, Failure> {
    serde_json::to_value(value)
        .map(Some)
        .map_err(|error| Failure::new("serialization", error.to_string(), 3))
}
