//! # Ingredient Queries
//!
//! Branch stock rows. Besides the generic document operations this adds the
//! name lookup used by cross-branch resolution and the low-stock report.

use sqlx::Sqlite;
use tracing::debug;

use comanda_core::resolver::normalize_name;
use comanda_core::{Ingredient, NameResolver};

use super::DocumentRepository;
use crate::error::DbResult;

impl DocumentRepository<Ingredient> {
    /// Finds the branch row whose normalized name equals `name`'s.
    ///
    /// If several rows share the name, the lowest id wins.
    pub async fn find_by_name(&self, branch_id: &str, name: &str) -> DbResult<Option<Ingredient>> {
        let key = normalize_name(name);
        debug!(branch_id = %branch_id, name = %key, "Looking up ingredient by name");

        let body: Option<String> = sqlx::query_scalar::<Sqlite, String>(
            r#"
            SELECT body FROM ingredients
            WHERE branch_id = ?1 AND normalized_name = ?2
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(branch_id)
        .bind(&key)
        .fetch_optional(self.pool())
        .await?;

        Ok(body.as_deref().map(serde_json::from_str).transpose()?)
    }

    /// Ingredients at or below their minimum stock, ordered by name.
    pub async fn list_below_min(&self, branch_id: &str) -> DbResult<Vec<Ingredient>> {
        let mut low: Vec<Ingredient> = self
            .list_by_branch(branch_id)
            .await?
            .into_iter()
            .filter(Ingredient::is_below_min)
            .collect();
        low.sort_by_cached_key(Ingredient::normalized_name);
        Ok(low)
    }

    /// Resolver over every branch's rows (ids ascending, so the lowest id
    /// wins a name clash just like [`find_by_name`](Self::find_by_name)).
    pub async fn resolver(&self) -> DbResult<NameResolver> {
        Ok(NameResolver::new(self.list().await?))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use comanda_core::{Ingredient, IngredientResolver};
    use rust_decimal_macros::dec;

    fn row(id: &str, branch: &str, name: &str, stock: rust_decimal::Decimal) -> Ingredient {
        let mut ing = Ingredient::new(id, branch, name, "g");
        ing.stock = stock;
        ing.min_stock = dec!(500);
        ing
    }

    #[tokio::test]
    async fn test_find_by_name_is_case_and_space_insensitive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ingredients();
        repo.put(&row("b2-cheese", "b2", "Mozzarella", dec!(1000)))
            .await
            .unwrap();

        let found = repo.find_by_name("b2", "  MOZZARELLA").await.unwrap();
        assert_eq!(found.map(|i| i.id), Some("b2-cheese".to_string()));
        assert!(repo.find_by_name("b1", "mozzarella").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_below_min_filters_branch_and_threshold() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ingredients();
        repo.put(&row("1", "b1", "Tomato", dec!(200))).await.unwrap();
        repo.put(&row("2", "b1", "Basil", dec!(500))).await.unwrap();
        repo.put(&row("3", "b1", "Flour", dec!(9000))).await.unwrap();
        repo.put(&row("4", "b2", "Oil", dec!(0))).await.unwrap();

        let low = repo.list_below_min("b1").await.unwrap();
        let names: Vec<_> = low.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Basil", "Tomato"]);
    }

    #[tokio::test]
    async fn test_resolver_spans_branches() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ingredients();
        repo.put(&row("a-cheese", "a", "Mozzarella", dec!(0))).await.unwrap();
        repo.put(&row("b-cheese", "b", "mozzarella", dec!(0))).await.unwrap();

        let resolver = repo.resolver().await.unwrap();
        assert_eq!(resolver.resolve("a-cheese", "b").id(), "b-cheese");
    }
}
