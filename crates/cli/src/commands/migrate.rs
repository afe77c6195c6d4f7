use bloom_core::config::StorageBackend;
use bloom_db::{connect_for, migrations};

use crate::commands::{prepare, CommandResult};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("migrate") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    if config.storage.backend != StorageBackend::Sqlite {
        return CommandResult::success(
            "migrate",
            format!(
                "storage backend `{}` has no schema; nothing to migrate",
                config.storage.backend.as_str()
            ),
        );
    }

    let result = runtime.block_on(async {
        let pool = connect_for(&config.storage)
            .await
            .map_err(|error| ("storage_connect", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<(), (&'static str, String, u8)>(())
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
