use chrono::Utc;
use clap::{Args, Subcommand};
use tracing::info;

use bloom_core::domain::product::ProductId;
use bloom_core::domain::review::Review;
use bloom_core::domain::user::UserId;

use crate::commands::{store_error, to_data, with_stores, CommandResult, Failure};

#[derive(Debug, Clone, Subcommand)]
pub enum ReviewCommand {
    #[command(about = "Add a review and refresh the product's rating")]
    Add(AddReviewArgs),
}

#[derive(Debug, Clone, Args)]
pub struct AddReviewArgs {
    pub product_id: String,
    #[arg(long, help = "Star rating from 0 to 5")]
    pub rating: f64,
    #[arg(long)]
    pub author: String,
    #[arg(long, default_value = "")]
    pub comment: String,
}

pub fn run(command: ReviewCommand) -> CommandResult {
    match command {
        ReviewCommand::Add(args) => add(args),
    }
}

fn add(args: AddReviewArgs) -> CommandResult {
    with_stores("review", |_config, stores| async move {
        let product_id = ProductId(args.product_id);
        if stores.products.find_by_id(&product_id).await.map_err(store_error("review"))?.is_none()
        {
            return Err(Failure::new("not_found", format!("product `{product_id}` does not exist"), 6));
        }

        let review = Review {
            product_id: product_id.clone(),
            rating: args.rating,
            comment: args.comment,
            author_id: UserId(args.author),
            created_at: Utc::now(),
        };
        stores.reviews.add(review).await.map_err(store_error("review"))?;
        let product =
            stores.refresh_review_summary(&product_id).await.map_err(store_error("review"))?;

        info!(
            event_name = "review.added",
            product_id = %product_id,
            reviews = product.reviews,
            rating = product.rating,
            "review stored"
        );
        Ok(CommandResult::success_with_data(
            "review",
            format!("`{}` now rated {:.1} from {} reviews", product.name, product.rating, product.reviews),
            to_data(&product)?,
        ))
    })
}
