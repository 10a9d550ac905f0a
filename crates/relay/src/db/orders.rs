//! Database operations for order records.
//!
//! Queries use the runtime-checked sqlx API; the row mapping is the
//! `sqlx::FromRow` derive on [`Order`].

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::RepositoryError;
use crate::models::{NewOrder, Order};
use crate::reconcile::OrderStore;

/// Postgres unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new order record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when an order with the same
    /// external id already exists (webhook redelivery), or
    /// `RepositoryError::Database` on other failures.
    pub async fn create(&self, new_order: NewOrder) -> Result<Order, RepositoryError> {
        let result = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders (
                first_name, last_name, phone, items, shipping_method,
                external_id, order_number, tracking_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING
                id, first_name, last_name, phone, items, shipping_method,
                external_id, order_number, tracking_url, customer_notified,
                created_at
            ",
        )
        .bind(&new_order.first_name)
        .bind(&new_order.last_name)
        .bind(&new_order.phone)
        .bind(&new_order.items)
        .bind(new_order.shipping_method)
        .bind(new_order.external_id)
        .bind(&new_order.order_number)
        .bind(&new_order.tracking_url)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(order) => Ok(order),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(RepositoryError::Conflict(format!(
                    "order {} already ingested",
                    new_order.external_id
                )))
            }
            Err(e) => Err(RepositoryError::Database(e)),
        }
    }

    /// List all open orders.
    ///
    /// Every row is open by definition: terminal orders are deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT
                id, first_name, last_name, phone, items, shipping_method,
                external_id, order_number, tracking_url, customer_notified,
                created_at
            FROM orders
            ORDER BY created_at
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT
                id, first_name, last_name, phone, items, shipping_method,
                external_id, order_number, tracking_url, customer_notified,
                created_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Persist a newly discovered tracking URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order no longer exists,
    /// or `RepositoryError::Database` on query failure.
    pub async fn set_tracking_url(&self, id: Uuid, url: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET tracking_url = $2
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(url)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Flip the customer-notified flag, but only if it is still unset.
    ///
    /// Returns `true` when this call won the flip. The guard makes the
    /// flag transition single-shot: a second caller (or a racing cycle)
    /// observes `false` and must not send the heads-up again.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_customer_notified(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET customer_notified = TRUE
            WHERE id = $1 AND customer_notified = FALSE
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an order record (terminal status reached).
    ///
    /// Deleting an already-deleted order is a no-op; the terminal
    /// transition tolerates a racing delete.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn list_open(&self) -> Result<Vec<Order>, RepositoryError> {
        self.list_all().await
    }

    async fn set_tracking_url(&self, id: Uuid, url: &str) -> Result<(), RepositoryError> {
        Self::set_tracking_url(self, id, url).await
    }

    async fn mark_customer_notified(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Self::mark_customer_notified(self, id).await
    }

    async fn delete_order(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.delete(id).await
    }
}
