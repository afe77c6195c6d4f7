use std::env;
use std::sync::{Mutex, OnceLock};

use bloom_cli::commands::browse::{self, BrowseArgs};
use bloom_cli::commands::cart::{self, CartArgs};
use bloom_cli::commands::product::{self, AddProductArgs, ProductCommand, UpdateProductArgs};
use bloom_cli::commands::quiz::{self, QuizArgs};
use bloom_cli::commands::recommend::{self, RecommendArgs};
use bloom_cli::commands::review::{self, AddReviewArgs, ReviewCommand};
use bloom_cli::commands::{config, doctor, migrate, seed};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("BLOOM_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_is_a_noop_for_file_backends() {
    with_json_store(|| {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert!(payload["message"].as_str().unwrap_or_default().contains("nothing to migrate"));
    });
}

#[test]
fn invalid_config_fails_with_exit_two() {
    with_env(&[("BLOOM_STORAGE_BACKEND", "postgres")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_json_store(|| {
        let first = parse_payload(&seed::run().output);
        assert_eq!(first["status"], "ok");
        assert_eq!(first["data"]["products_inserted"], 10);

        let second = parse_payload(&seed::run().output);
        assert_eq!(second["status"], "ok");
        assert_eq!(second["data"]["products_inserted"], 0);
        assert_eq!(second["data"]["products_skipped"], 10);
        assert_eq!(second["data"]["reviews_inserted"], 0);
    });
}

#[test]
fn browse_applies_filters_search_and_sort() {
    with_json_store(|| {
        assert_eq!(seed::run().exit_code, 0);

        let sustainable = browse::run(BrowseArgs {
            category: Some("sustainable".into()),
            ..BrowseArgs::default()
        });
        let payload = parse_payload(&sustainable.output);
        let sustainable_ids = ids(&payload["data"]["products"]);
        assert_eq!(sustainable_ids.len(), 10);
        assert_eq!(sustainable_ids[..2], ["bloom-008", "bloom-006"]);
        assert_eq!(sustainable_ids.last().map(String::as_str), Some("bloom-009"));

        let cheapest_low = browse::run(BrowseArgs {
            price: Some("low".into()),
            sort: Some("price_asc".into()),
            ..BrowseArgs::default()
        });
        let payload = parse_payload(&cheapest_low.output);
        assert_eq!(
            ids(&payload["data"]["products"]),
            vec!["bloom-005", "bloom-008", "bloom-001", "bloom-004"]
        );

        let search = browse::run(BrowseArgs { search: "PETAL".into(), ..BrowseArgs::default() });
        let payload = parse_payload(&search.output);
        assert_eq!(ids(&payload["data"]["products"]), vec!["bloom-005", "bloom-001"]);
        assert_eq!(payload["data"]["brands"].as_array().map(Vec::len), Some(5));
    });
}

#[test]
fn quiz_answers_drive_the_bloom_box() {
    with_json_store(|| {
        assert_eq!(seed::run().exit_code, 0);

        let without_quiz = parse_payload(
            &recommend::run(RecommendArgs { user: "ada".into(), count: Some(2) }).output,
        );
        assert_eq!(ids_in_box(&without_quiz), vec!["bloom-001", "bloom-002"]);

        let saved = quiz::run(QuizArgs {
            user: "ada".into(),
            product_types: vec!["serum".into()],
            markers: vec!["crueltyFree".into()],
            ..QuizArgs::default()
        });
        assert_eq!(saved.exit_code, 0, "{}", saved.output);

        let boxed = parse_payload(
            &recommend::run(RecommendArgs { user: "ada".into(), count: Some(2) }).output,
        );
        let picked = ids_in_box(&boxed);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0], "bloom-006");
        assert!(boxed["data"]["box"][0]["score"].as_f64().unwrap_or_default() > 13.0);
    });
}

#[test]
fn quiz_rejects_unknown_markers() {
    with_json_store(|| {
        let result = quiz::run(QuizArgs {
            user: "ada".into(),
            markers: vec!["vegan".into()],
            ..QuizArgs::default()
        });

        assert_eq!(result.exit_code, 6);
        assert_eq!(parse_payload(&result.output)["error_class"], "bad_request");
    });
}

#[test]
fn cart_totals_apply_coupons_and_reject_bad_ones() {
    with_json_store(|| {
        assert_eq!(seed::run().exit_code, 0);

        let priced = cart::run(CartArgs {
            items: vec!["bloom-001:2".into()],
            coupon: Some("bloom5".into()),
        });
        assert_eq!(priced.exit_code, 0, "{}", priced.output);
        let payload = parse_payload(&priced.output);
        assert!(payload["message"].as_str().unwrap_or_default().contains("total 31.00"));
        assert_eq!(payload["data"]["coupon"], "BLOOM5");

        let below_minimum = cart::run(CartArgs {
            items: vec!["bloom-005".into()],
            coupon: Some("BLOOM5".into()),
        });
        assert_eq!(below_minimum.exit_code, 6);

        let unknown = cart::run(CartArgs {
            items: vec!["bloom-005".into()],
            coupon: Some("NOPE".into()),
        });
        assert_eq!(unknown.exit_code, 6);

        let missing = cart::run(CartArgs { items: vec!["ghost".into()], coupon: None });
        assert_eq!(missing.exit_code, 6);
        assert_eq!(parse_payload(&missing.output)["error_class"], "not_found");
    });
}

#[test]
fn product_lifecycle_and_reviews() {
    with_json_store(|| {
        let added = product::run(ProductCommand::Add(AddProductArgs {
            id: Some("p-new".into()),
            name: "Mint Lip Balm".into(),
            price: Decimal::new(650, 2),
            brand: "Fern & Co".into(),
            product_type: "lip balm".into(),
            description: String::new(),
            image: String::new(),
            markers: vec!["recyclable".into()],
        }));
        assert_eq!(added.exit_code, 0, "{}", added.output);

        let updated = product::run(ProductCommand::Update(UpdateProductArgs {
            id: "p-new".into(),
            price: Some(Decimal::new(700, 2)),
            ..UpdateProductArgs::default()
        }));
        assert_eq!(parse_payload(&updated.output)["data"]["price"], "7.00");

        for rating in [5.0, 4.0] {
            let reviewed = review::run(ReviewCommand::Add(AddReviewArgs {
                product_id: "p-new".into(),
                rating,
                author: "ada".into(),
                comment: "nice".into(),
            }));
            assert_eq!(reviewed.exit_code, 0, "{}", reviewed.output);
        }
        let listed = parse_payload(&product::run(ProductCommand::List).output);
        assert_eq!(listed["data"][0]["reviews"], 2);
        assert_eq!(listed["data"][0]["rating"], 4.5);

        let orphan = review::run(ReviewCommand::Add(AddReviewArgs {
            product_id: "ghost".into(),
            rating: 3.0,
            author: "ada".into(),
            comment: String::new(),
        }));
        assert_eq!(orphan.exit_code, 6);

        assert_eq!(product::run(ProductCommand::Delete { id: "p-new".into() }).exit_code, 0);
        let again = product::run(ProductCommand::Delete { id: "p-new".into() });
        assert_eq!(parse_payload(&again.output)["error_class"], "not_found");
    });
}

#[test]
fn added_product_leads_the_new_category() {
    with_json_store(|| {
        assert_eq!(seed::run().exit_code, 0);

        let added = product::run(ProductCommand::Add(AddProductArgs {
            id: Some("fresh".into()),
            name: "Fresh Face Mist".into(),
            price: Decimal::new(1200, 2),
            brand: "Solenne".into(),
            product_type: "mist".into(),
            description: String::new(),
            image: String::new(),
            markers: Vec::new(),
        }));
        let payload = parse_payload(&added.output);
        assert_ne!(payload["data"]["createdAt"], "1970-01-01T00:00:00Z");

        for args in [
            BrowseArgs { category: Some("new".into()), ..BrowseArgs::default() },
            BrowseArgs { sort: Some("newest".into()), ..BrowseArgs::default() },
        ] {
            let shown = ids(&parse_payload(&browse::run(args).output)["data"]["products"]);
            assert_eq!(shown.first().map(String::as_str), Some("fresh"));
            assert_eq!(shown.len(), 11);
        }
    });
}

#[test]
fn rejected_cart_leaves_popularity_untouched() {
    with_json_store(|| {
        assert_eq!(seed::run().exit_code, 0);

        let failures = [
            CartArgs { items: vec!["bloom-001".into()], coupon: Some("NOPE".into()) },
            CartArgs { items: vec!["bloom-001".into()], coupon: Some("BLOOM5".into()) },
            CartArgs { items: vec!["bloom-001".into(), "ghost".into()], coupon: None },
        ];
        for args in failures {
            assert_eq!(cart::run(args).exit_code, 6);
        }
        assert_eq!(popularity_of("bloom-001"), Some(42));

        let priced = cart::run(CartArgs {
            items: vec!["bloom-001".into(), "bloom-001:2".into()],
            coupon: Some("WELCOME10".into()),
        });
        assert_eq!(priced.exit_code, 0, "{}", priced.output);
        assert_eq!(popularity_of("bloom-001"), Some(44));
    });
}

#[test]
fn unknown_sort_falls_back_to_newest_not_the_configured_default() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("bloom.json").to_string_lossy().into_owned();
    with_env(
        &[
            ("BLOOM_STORAGE_BACKEND", "json_file"),
            ("BLOOM_JSON_PATH", &path),
            ("BLOOM_DEFAULT_SORT", "price_asc"),
        ],
        || {
            assert_eq!(seed::run().exit_code, 0);

            let omitted = parse_payload(&browse::run(BrowseArgs::default()).output);
            let unknown = parse_payload(
                &browse::run(BrowseArgs { sort: Some("sideways".into()), ..BrowseArgs::default() })
                    .output,
            );

            assert_eq!(ids(&omitted["data"]["products"]).first().map(String::as_str), Some("bloom-005"));
            assert_eq!(ids(&unknown["data"]["products"]).first().map(String::as_str), Some("bloom-010"));
        },
    );
}

#[test]
fn config_reports_env_sources() {
    with_env(&[("BLOOM_BOX_SIZE", "6")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("- catalog.box_size = 6 (source: env (BLOOM_BOX_SIZE))"));
        assert!(result.output.contains("- storage.backend = sqlite (source: default)"));
    });
}

#[test]
fn doctor_flags_missing_seed_catalogue() {
    with_env(&[("BLOOM_STORAGE_BACKEND", "memory")], || {
        let report: Value =
            serde_json::from_str(&doctor::run(true)).expect("doctor emits json");

        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][0]["status"], "pass");
        assert_eq!(report["checks"][1]["name"], "storage_connectivity");
        assert_eq!(report["checks"][1]["status"], "pass");
        assert_eq!(report["checks"][2]["name"], "seed_catalog");
        assert_eq!(report["checks"][2]["status"], "fail");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn popularity_of(id: &str) -> Option<u64> {
    let listed = parse_payload(&product::run(ProductCommand::List).output);
    listed["data"]
        .as_array()?
        .iter()
        .find(|product| product["id"] == id)
        .and_then(|product| product["popularity"].as_u64())
}

fn ids(products: &Value) -> Vec<String> {
    products
        .as_array()
        .map(|products| {
            products.iter().filter_map(|product| product["id"].as_str().map(str::to_string)).collect()
        })
        .unwrap_or_default()
}

fn ids_in_box(payload: &Value) -> Vec<String> {
    payload["data"]["box"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["product"]["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn with_json_store(test_fn: impl FnOnce()) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("bloom.json");
    let path = path.to_string_lossy().into_owned();
    with_env(&[("BLOOM_STORAGE_BACKEND", "json_file"), ("BLOOM_JSON_PATH", &path)], test_fn);
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "BLOOM_STORAGE_BACKEND",
        "BLOOM_DATABASE_URL",
        "BLOOM_DATABASE_MAX_CONNECTIONS",
        "BLOOM_DATABASE_TIMEOUT_SECS",
        "BLOOM_JSON_PATH",
        "BLOOM_BOX_SIZE",
        "BLOOM_DEFAULT_SORT",
        "BLOOM_LOGGING_LEVEL",
        "BLOOM_LOGGING_FORMAT",
        "BLOOM_LOG_LEVEL",
        "BLOOM_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
