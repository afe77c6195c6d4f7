use bloom_db::SeedCatalog;

use crate::commands::{store_error, to_data, with_stores, CommandResult, Failure};

pub fn run() -> CommandResult {
    with_stores("seed", |_config, stores| async move {
        let seeded = SeedCatalog::load(&stores).await.map_err(store_error("seed"))?;
        let verification = SeedCatalog::verify(&stores).await.map_err(store_error("seed"))?;

        if !verification.all_present {
            let failed_checks = failed_checks(&verification.checks);
            return Err(Failure::new("seed_verification", verification_message(&failed_checks), 6));
        }

        let message = format!(
            "seed catalogue ready on `{}` backend: {} products inserted, {} already present, {} reviews, {} coupons",
            stores.backend.as_str(),
            seeded.products_inserted,
            seeded.products_skipped,
            seeded.reviews_inserted,
            seeded.coupons_inserted
        );
        Ok(CommandResult::success_with_data("seed", message, to_data(&seeded)?))
    })
}

fn failed_checks(checks: &[(&'static str, bool)]) -> Vec<&'static str> {
    checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect()
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
