use bloom_core::domain::product::Product;
use bloom_core::domain::user::UserId;
use bloom_core::recommend::{recommend, BoxScorer};
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::commands::{store_error, to_data, with_stores, CommandResult};

#[derive(Debug, Clone, Args)]
pub struct RecommendArgs {
    #[arg(long, help = "User whose quiz answers drive the box")]
    pub user: String,
    #[arg(long, help = "Number of products in the box (defaults to catalog.box_size)")]
    pub count: Option<usize>,
}

pub fn run(args: RecommendArgs) -> CommandResult {
    with_stores("recommend", |config, stores| async move {
        let user = UserId(args.user);
        let profile = stores.preferences.get(&user).await.map_err(store_error("recommend"))?;
        let products = stores.products.list().await.map_err(store_error("recommend"))?;
        let count = args.count.unwrap_or(config.catalog.box_size);

        let picked = recommend(&products, profile.as_ref(), count);
        let scores: Vec<Option<f64>> = picked
            .iter()
            .map(|product| profile.as_ref().map(|profile| BoxScorer::new(profile).score(product)))
            .collect();

        info!(
            event_name = "recommend.box_filled",
            user = %user,
            has_profile = profile.is_some(),
            requested = count,
            picked = picked.len(),
            "bloom box assembled"
        );

        let message = match profile {
            Some(_) => format!("{} products picked for `{user}`", picked.len()),
            None => format!(
                "no quiz answers for `{user}`; showing the first {} catalogue products",
                picked.len()
            ),
        };
        let items: Vec<BoxItem<'_>> =
            picked.iter().zip(scores).map(|(product, score)| BoxItem { product, score }).collect();
        let data = to_data(BoxView { user: &user, items })?;
        Ok(CommandResult::success_with_data("recommend", message, data))
    })
}

#[derive(Serialize)]
struct BoxItem<'a> {
    product: &'a Product,
    score: Option<f64>,
}

#[derive(Serialize)]
struct BoxView<'a> {
    user: &'a UserId,
    #[serde(rename = "box")]
    items: Vec<BoxItem<'a>>,
}
