//! # Order Queries

use sqlx::Sqlite;

use comanda_core::{Order, OrderStatus};

use super::DocumentRepository;
use crate::error::DbResult;

impl DocumentRepository<Order> {
    /// Orders of a branch in one status, oldest id first.
    pub async fn list_by_status(&self, branch_id: &str, status: OrderStatus) -> DbResult<Vec<Order>> {
        let bodies: Vec<String> = sqlx::query_scalar::<Sqlite, String>(
            r#"
            SELECT body FROM orders
            WHERE branch_id = ?1 AND status = ?2
            ORDER BY id
            "#,
        )
        .bind(branch_id)
        .bind(status.as_str())
        .fetch_all(self.pool())
        .await?;

        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(Into::into))
            .collect()
    }

    /// Orders still being worked on (OPEN or COOKING).
    pub async fn list_active(&self, branch_id: &str) -> DbResult<Vec<Order>> {
        let mut orders = self.list_by_status(branch_id, OrderStatus::Open).await?;
        orders.extend(self.list_by_status(branch_id, OrderStatus::Cooking).await?);
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use chrono::{Duration, Utc};
    use comanda_core::{Order, OrderStatus, OrderType};

    #[tokio::test]
    async fn test_list_active_excludes_terminal_orders() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.orders();
        let t0 = Utc::now();

        let open = Order::new("o1", "b1", OrderType::DineIn, t0);
        let mut cooking = Order::new("o2", "b1", OrderType::Takeout, t0 - Duration::minutes(5));
        cooking.status = OrderStatus::Cooking;
        let mut paid = Order::new("o3", "b1", OrderType::DineIn, t0);
        paid.status = OrderStatus::Paid;
        let other_branch = Order::new("o4", "b2", OrderType::DineIn, t0);

        for o in [&open, &cooking, &paid, &other_branch] {
            repo.put(o).await.unwrap();
        }

        let active = repo.list_active("b1").await.unwrap();
        let ids: Vec<_> = active.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o2", "o1"]);

        let paid_orders = repo.list_by_status("b1", OrderStatus::Paid).await.unwrap();
        assert_eq!(paid_orders.len(), 1);
    }
}
