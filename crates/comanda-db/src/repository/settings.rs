//! # Settings Access
//!
//! Business settings live in a single document. The engine only reads them;
//! defaults stand in until one is saved.

use comanda_core::Settings;

use super::DocumentRepository;
use crate::document::SETTINGS_ID;
use crate::error::DbResult;

impl DocumentRepository<Settings> {
    /// Stored settings, or the defaults when none were saved.
    pub async fn current(&self) -> DbResult<Settings> {
        Ok(self.get(SETTINGS_ID).await?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use comanda_core::{Money, Settings};

    #[tokio::test]
    async fn test_defaults_until_saved() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.settings();
        assert_eq!(repo.current().await.unwrap(), Settings::default());

        let mut custom = Settings::default();
        custom.currency_symbol = "€".to_string();
        custom.spending_per_point = Money::from_cents(500);
        repo.put(&custom).await.unwrap();

        let back = repo.current().await.unwrap();
        assert_eq!(back.currency_symbol, "€");
        assert_eq!(back.spending_per_point, Money::from_cents(500));
    }
}
