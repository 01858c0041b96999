//! Order repository.
//!
//! Orders are insert-only. `payment_reference` is unique, so replaying a
//! payment callback returns the order that was already written instead of
//! creating a second one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

use adire_core::{
    CartLine, Email, LocationType, Naira, NewOrder, Order, OrderId, OrderStatus, PaymentStatus,
    ShippingAddress,
};

use super::{Database, RepositoryError};

/// Outcome of writing an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderInsert {
    /// A new order was written.
    Created(Order),
    /// An order with the same payment reference already existed.
    Existing(Order),
}

impl OrderInsert {
    /// The stored order, new or not.
    #[must_use]
    pub fn into_order(self) -> Order {
        match self {
            Self::Created(order) | Self::Existing(order) => order,
        }
    }

    /// Whether this call created the order.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Repository for order persistence.
pub struct OrderRepository<'a> {
    db: &'a Database,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_email: String,
    customer_name: String,
    customer_phone: String,
    shipping_address: Json<ShippingAddress>,
    shipping_location: String,
    shipping_location_type: String,
    shipping_provider: String,
    shipping_fee: Decimal,
    items: Json<Vec<CartLine>>,
    subtotal: Decimal,
    total_amount: Decimal,
    payment_method: String,
    payment_reference: String,
    payment_status: String,
    order_status: String,
    created_at: DateTime<Utc>,
    estimated_delivery: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |field: &str, e: String| {
            RepositoryError::DataCorruption(format!("invalid {field} in order {id}: {e}"))
        };

        Ok(Self {
            id: OrderId::from_uuid(id),
            customer_email: Email::parse(&row.customer_email)
                .map_err(|e| corrupt("customer_email", e.to_string()))?,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            shipping_address: row.shipping_address.0,
            shipping_location: row.shipping_location,
            shipping_location_type: row
                .shipping_location_type
                .parse::<LocationType>()
                .map_err(|e| corrupt("shipping_location_type", e))?,
            shipping_provider: row.shipping_provider,
            shipping_fee: Naira::new(row.shipping_fee),
            items: row.items.0,
            subtotal: Naira::new(row.subtotal),
            total_amount: Naira::new(row.total_amount),
            payment_method: row.payment_method,
            payment_reference: row.payment_reference,
            payment_status: row
                .payment_status
                .parse::<PaymentStatus>()
                .map_err(|e| corrupt("payment_status", e))?,
            order_status: row
                .order_status
                .parse::<OrderStatus>()
                .map_err(|e| corrupt("order_status", e))?,
            created_at: row.created_at,
            estimated_delivery: row.estimated_delivery,
        })
    }
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Write an order, assigning its id and timestamp.
    ///
    /// If an order with the same payment reference exists it is returned
    /// unchanged as [`OrderInsert::Existing`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn create(&self, new_order: NewOrder) -> Result<OrderInsert, RepositoryError> {
        let order = new_order.into_order(OrderId::new(), Utc::now());

        match self.db {
            Database::Postgres(pool) => {
                let inserted = sqlx::query_as::<_, OrderRow>(
                    r"
                    INSERT INTO storefront.customer_order (
                        id, customer_email, customer_name, customer_phone,
                        shipping_address, shipping_location, shipping_location_type,
                        shipping_provider, shipping_fee, items, subtotal, total_amount,
                        payment_method, payment_reference, payment_status, order_status,
                        created_at, estimated_delivery
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
                    ON CONFLICT (payment_reference) DO NOTHING
                    RETURNING id, customer_email, customer_name, customer_phone,
                              shipping_address, shipping_location, shipping_location_type,
                              shipping_provider, shipping_fee, items, subtotal, total_amount,
                              payment_method, payment_reference, payment_status, order_status,
                              created_at, estimated_delivery
                    ",
                )
                .bind(order.id)
                .bind(order.customer_email.as_str())
                .bind(&order.customer_name)
                .bind(&order.customer_phone)
                .bind(Json(&order.shipping_address))
                .bind(&order.shipping_location)
                .bind(order.shipping_location_type.as_str())
                .bind(&order.shipping_provider)
                .bind(order.shipping_fee.amount())
                .bind(Json(&order.items))
                .bind(order.subtotal.amount())
                .bind(order.total_amount.amount())
                .bind(&order.payment_method)
                .bind(&order.payment_reference)
                .bind(order.payment_status.as_str())
                .bind(order.order_status.as_str())
                .bind(order.created_at)
                .bind(order.estimated_delivery)
                .fetch_optional(pool)
                .await?;

                match inserted {
                    Some(row) => Ok(OrderInsert::Created(row.try_into()?)),
                    None => self
                        .get_by_reference(&order.payment_reference)
                        .await?
                        .map(OrderInsert::Existing)
                        .ok_or(RepositoryError::NotFound),
                }
            }
            Database::Memory(mem) => {
                mem.ensure_writable()?;
                let mut orders = mem.orders.write().await;
                if let Some(existing) = orders
                    .iter()
                    .find(|o| o.payment_reference == order.payment_reference)
                {
                    return Ok(OrderInsert::Existing(existing.clone()));
                }
                orders.push(order.clone());
                Ok(OrderInsert::Created(order))
            }
        }
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => sqlx::query_as::<_, OrderRow>(
                r"
                SELECT id, customer_email, customer_name, customer_phone,
                       shipping_address, shipping_location, shipping_location_type,
                       shipping_provider, shipping_fee, items, subtotal, total_amount,
                       payment_method, payment_reference, payment_status, order_status,
                       created_at, estimated_delivery
                FROM storefront.customer_order
                WHERE id = $1
                ",
            )
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(Order::try_from)
            .transpose(),
            Database::Memory(mem) => Ok(mem
                .orders
                .read()
                .await
                .iter()
                .find(|o| o.id == id)
                .cloned()),
        }
    }

    /// Get an order by its payment reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_reference(&self, reference: &str) -> Result<Option<Order>, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => sqlx::query_as::<_, OrderRow>(
                r"
                SELECT id, customer_email, customer_name, customer_phone,
                       shipping_address, shipping_location, shipping_location_type,
                       shipping_provider, shipping_fee, items, subtotal, total_amount,
                       payment_method, payment_reference, payment_status, order_status,
                       created_at, estimated_delivery
                FROM storefront.customer_order
                WHERE payment_reference = $1
                ",
            )
            .bind(reference)
            .fetch_optional(pool)
            .await?
            .map(Order::try_from)
            .transpose(),
            Database::Memory(mem) => Ok(mem
                .orders
                .read()
                .await
                .iter()
                .find(|o| o.payment_reference == reference)
                .cloned()),
        }
    }

    /// List orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: u32, offset: u32) -> Result<Vec<Order>, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => sqlx::query_as::<_, OrderRow>(
                r"
                SELECT id, customer_email, customer_name, customer_phone,
                       shipping_address, shipping_location, shipping_location_type,
                       shipping_provider, shipping_fee, items, subtotal, total_amount,
                       payment_method, payment_reference, payment_status, order_status,
                       created_at, estimated_delivery
                FROM storefront.customer_order
                ORDER BY created_at DESC
                LIMIT $1 OFFSET $2
                ",
            )
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect(),
            Database::Memory(mem) => {
                let mut orders = mem.orders.read().await.clone();
                orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(orders
                    .into_iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .collect())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use adire_core::{Cart, CheckoutDetails, Customer, PaymentConfirmation, ShippingSelection};

    use super::*;

    fn new_order(reference: &str) -> NewOrder {
        let mut cart = Cart::new();
        cart.add(CartLine {
            id: "kaftan".to_string(),
            name: "Adire Kaftan".to_string(),
            price: Naira::from_whole(10_000),
            quantity: 1,
            image: None,
        });
        let mut shipping = ShippingSelection::default();
        shipping.set_location_type(LocationType::Domestic);
        shipping.select_location("lagos-island").unwrap();
        let details = CheckoutDetails {
            country: "Nigeria".to_string(),
            state: "Lagos".to_string(),
            address: "3 Broad Street".to_string(),
            phone: "08010000000".to_string(),
            shipping,
            policy_agreed: true,
        };

        NewOrder::draft(
            &details,
            &cart,
            Customer {
                email: Email::parse("buyer@example.com").unwrap(),
                name: "Buyer".to_string(),
            },
            PaymentConfirmation {
                reference: reference.to_string(),
                channel: "card".to_string(),
                status: PaymentStatus::Success,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_memory_create_is_idempotent_per_reference() {
        let db = Database::memory();
        let repo = db.orders();

        let first = repo.create(new_order("REF-1")).await.unwrap();
        assert!(first.is_new());
        let first = first.into_order();
        assert_eq!(first.total_amount, Naira::from_whole(13_000));

        let second = repo.create(new_order("REF-1")).await.unwrap();
        assert!(!second.is_new());
        assert_eq!(second.into_order().id, first.id);

        let Database::Memory(mem) = &db else {
            unreachable!()
        };
        assert_eq!(mem.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_memory_read_only_rejects_writes() {
        let db = Database::memory();
        let Database::Memory(mem) = &db else {
            unreachable!()
        };

        mem.set_read_only(true);
        let err = db.orders().create(new_order("REF-RO")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Unavailable(_)));
        assert_eq!(mem.order_count().await, 0);
        assert_eq!(db.orders().get_by_reference("REF-RO").await.unwrap(), None);

        mem.set_read_only(false);
        assert!(db.orders().create(new_order("REF-RO")).await.unwrap().is_new());
    }

    #[tokio::test]
    async fn test_memory_lookup_by_id_and_reference() {
        let db = Database::memory();
        let order = db.orders().create(new_order("REF-2")).await.unwrap().into_order();

        assert_eq!(db.orders().get(order.id).await.unwrap(), Some(order.clone()));
        assert_eq!(
            db.orders().get_by_reference("REF-2").await.unwrap(),
            Some(order)
        );
        assert_eq!(db.orders().get_by_reference("REF-3").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_list_recent_is_newest_first() {
        let db = Database::memory();
        for reference in ["A", "B", "C"] {
            db.orders().create(new_order(reference)).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let orders = db.orders().list_recent(2, 0).await.unwrap();
        let references: Vec<_> = orders.iter().map(|o| o.payment_reference.as_str()).collect();
        assert_eq!(references, ["C", "B"]);

        let rest = db.orders().list_recent(2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].payment_reference, "A");
    }
}
