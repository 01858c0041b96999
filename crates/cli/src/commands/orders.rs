//! Order inspection commands.

use adire_core::Order;
use adire_storefront::db::Database;

use super::{CommandError, connect};

/// Print recent orders, newest first.
pub async fn list(limit: u32, offset: u32, json: bool) -> Result<(), CommandError> {
    let database = Database::Postgres(connect().await?);
    let orders = database.orders().list_recent(limit, offset).await?;

    #[allow(clippy::print_stdout)]
    {
        if json {
            println!("{}", serde_json::to_string_pretty(&orders)?);
        } else if orders.is_empty() {
            println!("No orders");
        } else {
            for order in &orders {
                println!("{}", summary_line(order));
            }
        }
    }

    Ok(())
}

fn summary_line(order: &Order) -> String {
    format!(
        "{}  {}  {:<24}  {:>14}  {}  {}",
        order.created_at.format("%Y-%m-%d %H:%M"),
        order.payment_reference,
        order.customer_email.as_str(),
        order.total_amount.to_string(),
        order.payment_status.as_str(),
        order.order_status.as_str(),
    )
}
