use bloom_core::config::{AppConfig, LoadOptions, StorageBackend};
use bloom_db::{open_stores, ping, SeedCatalog, Stores};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_storage(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck::skipped("storage_connectivity", "configuration did not load"));
            checks.push(DoctorCheck::skipped("seed_catalog", "configuration did not load"));
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_storage(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "storage_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                DoctorCheck::skipped("seed_catalog", "no async runtime"),
            ];
        }
    };

    runtime.block_on(async {
        let stores = match open_stores(&config.storage).await {
            Ok(stores) => stores,
            Err(error) => {
                return vec![
                    DoctorCheck {
                        name: "storage_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to open storage: {error}"),
                    },
                    DoctorCheck::skipped("seed_catalog", "storage is unreachable"),
                ];
            }
        };

        let checks = vec![connectivity(config, &stores).await, seed_catalog(&stores).await];
        if let Some(pool) = stores.pool() {
            pool.close().await;
        }
        checks
    })
}

async fn connectivity(config: &AppConfig, stores: &Stores) -> DoctorCheck {
    let reachable = match stores.pool() {
        Some(pool) => ping(pool).await.map_err(|error| error.to_string()),
        None => stores.products.list().await.map(|_| ()).map_err(|error| error.to_string()),
    };

    match reachable {
        Ok(()) => DoctorCheck {
            name: "storage_connectivity",
            status: CheckStatus::Pass,
            details: format!(
                "`{}` backend reachable{}",
                config.storage.backend.as_str(),
                location(config)
            ),
        },
        Err(error) => DoctorCheck {
            name: "storage_connectivity",
            status: CheckStatus::Fail,
            details: format!("storage probe failed: {error}"),
        },
    }
}

fn location(config: &AppConfig) -> String {
    match config.storage.backend {
        StorageBackend::Memory => String::new(),
        StorageBackend::JsonFile => format!(" at `{}`", config.storage.json_path.display()),
        StorageBackend::Sqlite => format!(" at `{}`", config.storage.database_url),
    }
}

/// A missing seed catalogue is reported as a failed check with the gaps
/// named; it never blocks the other checks.
async fn seed_catalog(stores: &Stores) -> DoctorCheck {
    match SeedCatalog::verify(stores).await {
        Ok(verification) if verification.all_present => DoctorCheck {
            name: "seed_catalog",
            status: CheckStatus::Pass,
            details: "seed products, reviews and coupons are present".to_string(),
        },
        Ok(verification) => {
            let missing: Vec<&str> = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect();
            DoctorCheck {
                name: "seed_catalog",
                status: CheckStatus::Fail,
                details: format!("missing seed data ({}); run `bloom seed`", missing.join(", ")),
            }
        }
        Err(error) => DoctorCheck {
            name: "seed_catalog",
            status: CheckStatus::Fail,
            details: format!("seed verification failed: {error}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
