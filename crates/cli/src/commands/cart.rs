use clap::Args;
use serde::Serialize;
use tracing::info;

use bloom_core::cart::{Cart, CartLine, CartTotals};
use bloom_core::domain::product::ProductId;
use bloom_core::errors::{ApplicationError, DomainError};

use crate::commands::{store_error, to_data, with_stores, CommandResult, Failure};

#[derive(Debug, Clone, Args)]
pub struct CartArgs {
    #[arg(long = "add", required = true, help = "Product to add as `id` or `id:quantity` (repeatable)")]
    pub items: Vec<String>,
    #[arg(long, help = "Coupon code to apply to the subtotal")]
    pub coupon: Option<String>,
}

/// Splits `id[:quantity]`. A missing quantity means one unit.
pub fn parse_item(raw: &str) -> Result<(ProductId, u32), DomainError> {
    let (id, quantity) = match raw.rsplit_once(':') {
        Some((id, quantity)) => {
            let quantity = quantity.trim().parse::<u32>().map_err(|_| {
                DomainError::InvariantViolation(format!("invalid quantity in `{raw}`"))
            })?;
            (id, quantity)
        }
        None => (raw, 1),
    };

    let id = id.trim();
    if id.is_empty() {
        return Err(DomainError::InvariantViolation(format!("missing product id in `{raw}`")));
    }
    Ok((ProductId(id.to_string()), quantity))
}

fn domain_failure(error: DomainError) -> Failure {
    Failure::from_application("cart", ApplicationError::Domain(error))
}

#[derive(Serialize)]
struct CartView<'a> {
    lines: &'a [CartLine],
    items: u32,
    #[serde(flatten)]
    totals: CartTotals,
}

pub fn run(args: CartArgs) -> CommandResult {
    with_stores("cart", |_config, stores| async move {
        let mut cart = Cart::new();
        let mut added = Vec::with_capacity(args.items.len());
        for raw in &args.items {
            let (id, quantity) = parse_item(raw).map_err(domain_failure)?;
            let product = stores
                .products
                .find_by_id(&id)
                .await
                .map_err(store_error("cart"))?
                .ok_or_else(|| {
                    Failure::new("not_found", format!("product `{id}` does not exist"), 6)
                })?;
            cart.add(&product, quantity).map_err(domain_failure)?;
            added.push(id);
        }

        let coupon = match args.coupon.as_deref().filter(|code| !code.trim().is_empty()) {
            Some(code) => {
                let found =
                    stores.coupons.find_by_code(code).await.map_err(store_error("cart"))?;
                Some(found.ok_or_else(|| {
                    Failure::new("bad_request", format!("unknown coupon `{}`", code.trim()), 6)
                })?)
            }
            None => None,
        };
        let totals = cart.totals(coupon.as_ref()).map_err(domain_failure)?;

        // Popularity only moves once the whole cart has been priced.
        for id in &added {
            stores.products.record_cart_add(id).await.map_err(store_error("cart"))?;
        }

        info!(
            event_name = "cart.priced",
            lines = cart.lines().len(),
            subtotal = %totals.subtotal,
            discount = %totals.discount,
            "cart totals computed"
        );
        let message = format!("{} items, total {}", cart.item_count(), totals.total);
        let data = to_data(CartView { lines: cart.lines(), items: cart.item_count(), totals })?;
        Ok(CommandResult::success_with_data("cart", message, data))
    })
}

#[cfg(test)]
mod tests {
    use super::parse_item;

    #[test]
    fn bare_id_is_one_unit() {
        let (id, quantity) = parse_item("bloom-001").expect("item");

        assert_eq!(id.as_str(), "bloom-001");
        assert_eq!(quantity, 1);
    }

    #[test]
    fn explicit_quantity_is_parsed() {
        let (id, quantity) = parse_item(" bloom-003 : 2").expect("item");

        assert_eq!(id.as_str(), "bloom-003");
        assert_eq!(quantity, 2);
    }

    #[test]
    fn malformed_items_are_rejected() {
        assert!(parse_item("bloom-001:many").is_err());
        assert!(parse_item(":3").is_err());
    }
}
