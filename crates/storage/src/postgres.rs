//! PostgreSQL [`Repository`] over the `drugs` and `users` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use tracing::{error, info, warn};

use pharmatrack_core::config::PostgresConfig;
use pharmatrack_core::{
    Account, AccountId, Drug, DrugId, DrugPatch, NewAccountRecord, NewDrug, Role,
    DEFAULT_STATUS,
};

use crate::error::StorageError;
use crate::repository::Repository;

const DRUG_COLUMNS: &str = "id, generic_name, brand_name, manufacturer, batch_number,
    expiration_date, dosage_form, strength, quantity, storage_conditions, packaging,
    composition, indication, contraindications, side_effects, status, created_at";

const USER_COLUMNS: &str = "id, username, password, email, role, is_active, email_notifications";

/// Row from the `drugs` table.
#[derive(Debug, sqlx::FromRow)]
struct DrugRow {
    id: i64,
    generic_name: String,
    brand_name: String,
    manufacturer: String,
    batch_number: String,
    expiration_date: String,
    dosage_form: String,
    strength: String,
    quantity: i32,
    storage_conditions: String,
    packaging: String,
    composition: String,
    indication: Option<String>,
    contraindications: Option<String>,
    side_effects: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<DrugRow> for Drug {
    fn from(row: DrugRow) -> Self {
        Drug {
            id: row.id,
            generic_name: row.generic_name,
            brand_name: row.brand_name,
            manufacturer: row.manufacturer,
            batch_number: row.batch_number,
            expiration_date: row.expiration_date,
            dosage_form: row.dosage_form,
            strength: row.strength,
            quantity: row.quantity,
            storage_conditions: row.storage_conditions,
            packaging: row.packaging,
            composition: row.composition,
            indication: row.indication,
            contraindications: row.contraindications,
            side_effects: row.side_effects,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// Row from the `users` table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
    email: Option<String>,
    role: String,
    is_active: bool,
    email_notifications: bool,
}

impl TryFrom<UserRow> for Account {
    type Error = StorageError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| StorageError::Corrupt(format!("user {}: {e}", row.id)))?;
        Ok(Account {
            id: row.id,
            username: row.username,
            password_hash: row.password,
            email: row.email,
            role,
            is_active: row.is_active,
            email_notifications: row.email_notifications,
        })
    }
}

/// Convert user rows, dropping rows that do not map to an account.
fn accounts_from_rows(rows: Vec<UserRow>) -> Vec<Account> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match Account::try_from(row) {
                Ok(account) => Some(account),
                Err(e) => {
                    warn!(user_id = id, error = %e, "skipping user with unreadable row");
                    None
                }
            }
        })
        .collect()
}

/// Overwrite every mutable column of `drug` on `conn`.
async fn write_drug(conn: &mut PgConnection, drug: &Drug) -> Result<Drug, StorageError> {
    let row = sqlx::query_as::<_, DrugRow>(&format!(
        "UPDATE drugs SET generic_name = $2, brand_name = $3, manufacturer = $4,
            batch_number = $5, expiration_date = $6, dosage_form = $7, strength = $8,
            quantity = $9, storage_conditions = $10, packaging = $11, composition = $12,
            indication = $13, contraindications = $14, side_effects = $15, status = $16
         WHERE id = $1
         RETURNING {DRUG_COLUMNS}"
    ))
    .bind(drug.id)
    .bind(&drug.generic_name)
    .bind(&drug.brand_name)
    .bind(&drug.manufacturer)
    .bind(&drug.batch_number)
    .bind(&drug.expiration_date)
    .bind(&drug.dosage_form)
    .bind(&drug.strength)
    .bind(drug.quantity)
    .bind(&drug.storage_conditions)
    .bind(&drug.packaging)
    .bind(&drug.composition)
    .bind(&drug.indication)
    .bind(&drug.contraindications)
    .bind(&drug.side_effects)
    .bind(&drug.status)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row.into())
}

fn map_unique_violation(e: sqlx::Error, username: &str) -> StorageError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some("23505") {
            return StorageError::Duplicate {
                kind: "username",
                value: username.to_string(),
            };
        }
    }
    error!("user store database error: {}", e);
    StorageError::Database(e)
}

/// Repository backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using `config` and apply pending migrations.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, StorageError> {
        if !config.is_configured() {
            return Err(StorageError::NotConfigured(
                "DATABASE_URL or PG_USERNAME not set".to_string(),
            ));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.connection_string())
            .await?;
        info!("PostgreSQL connected: {}", config.host);

        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!("Database migrations applied successfully");

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PgStore {
    async fn list_drugs(&self) -> Result<Vec<Drug>, StorageError> {
        let rows = sqlx::query_as::<_, DrugRow>(&format!(
            "SELECT {DRUG_COLUMNS} FROM drugs ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Drug::from).collect())
    }

    async fn get_drug(&self, id: DrugId) -> Result<Option<Drug>, StorageError> {
        let row = sqlx::query_as::<_, DrugRow>(&format!(
            "SELECT {DRUG_COLUMNS} FROM drugs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Drug::from))
    }

    async fn create_drug(&self, drug: NewDrug) -> Result<Drug, StorageError> {
        let row = sqlx::query_as::<_, DrugRow>(&format!(
            "INSERT INTO drugs (generic_name, brand_name, manufacturer, batch_number,
                expiration_date, dosage_form, strength, quantity, storage_conditions,
                packaging, composition, indication, contraindications, side_effects, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {DRUG_COLUMNS}"
        ))
        .bind(&drug.generic_name)
        .bind(&drug.brand_name)
        .bind(&drug.manufacturer)
        .bind(&drug.batch_number)
        .bind(drug.expiration_date.trim())
        .bind(&drug.dosage_form)
        .bind(&drug.strength)
        .bind(drug.quantity)
        .bind(&drug.storage_conditions)
        .bind(&drug.packaging)
        .bind(&drug.composition)
        .bind(&drug.indication)
        .bind(&drug.contraindications)
        .bind(&drug.side_effects)
        .bind(DEFAULT_STATUS)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update_drug(&self, id: DrugId, patch: DrugPatch) -> Result<Option<Drug>, StorageError> {
        // Row lock held until commit so concurrent patches apply in turn.
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, DrugRow>(&format!(
            "SELECT {DRUG_COLUMNS} FROM drugs WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut drug = Drug::from(row);
        patch.apply(&mut drug);
        let updated = write_drug(&mut tx, &drug).await?;
        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete_drug(&self, id: DrugId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM drugs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StorageError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>, StorageError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(Account::try_from)
        .transpose()
    }

    async fn create_account(&self, account: NewAccountRecord) -> Result<Account, StorageError> {
        let result = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, password, email, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.email)
        .bind(account.role.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Account::try_from(row),
            Err(e) => Err(map_unique_violation(e, &account.username)),
        }
    }

    async fn list_notifiable_accounts(&self) -> Result<Vec<Account>, StorageError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE is_active AND email_notifications
               AND email IS NOT NULL AND btrim(email) <> ''
             ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts_from_rows(rows))
    }

    async fn set_email_notifications(
        &self,
        id: AccountId,
        enabled: bool,
    ) -> Result<Option<Account>, StorageError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET email_notifications = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(enabled)
        .fetch_optional(&self.pool)
        .await?
        .map(Account::try_from)
        .transpose()
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_row(role: &str) -> UserRow {
        UserRow {
            id: 3,
            username: "dana".to_string(),
            password: "salt$hash".to_string(),
            email: Some("dana@example.com".to_string()),
            role: role.to_string(),
            is_active: true,
            email_notifications: true,
        }
    }

    #[test]
    fn user_row_maps_to_account() {
        let account = Account::try_from(user_row("manufacturer")).unwrap();
        assert_eq!(account.role, Role::Manufacturer);
        assert_eq!(account.password_hash, "salt$hash");
        assert!(account.is_notifiable());
    }

    #[test]
    fn unknown_role_is_corrupt() {
        let err = Account::try_from(user_row("superuser")).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
        assert!(err.to_string().contains("user 3"));
    }

    #[test]
    fn unreadable_user_rows_are_skipped() {
        let mut second = user_row("superuser");
        second.id = 4;
        let mut third = user_row("admin");
        third.id = 5;

        let accounts = accounts_from_rows(vec![user_row("pharmacist"), second, third]);
        let ids: Vec<AccountId> = accounts.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3, 5]);
    }

    async fn test_store() -> Option<PgStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .expect("connect to TEST_DATABASE_URL");
        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("apply migrations");
        Some(PgStore::new(pool))
    }

    fn new_drug() -> NewDrug {
        NewDrug {
            generic_name: "ibuprofen".to_string(),
            brand_name: "Advil".to_string(),
            manufacturer: "Acme".to_string(),
            batch_number: "B1".to_string(),
            expiration_date: "2030-01-01".to_string(),
            dosage_form: "tablet".to_string(),
            strength: "200mg".to_string(),
            quantity: 10,
            storage_conditions: "dry".to_string(),
            packaging: "box".to_string(),
            composition: "ibuprofen".to_string(),
            indication: None,
            contraindications: None,
            side_effects: None,
        }
    }

    #[tokio::test]
    async fn concurrent_patches_keep_both_fields() {
        let Some(store) = test_store().await else {
            eprintln!("TEST_DATABASE_URL not set, skipping");
            return;
        };

        for round in 0..20 {
            let drug = store.create_drug(new_drug()).await.unwrap();
            let quantity = DrugPatch {
                quantity: Some(100 + round),
                ..Default::default()
            };
            let status = DrugPatch {
                status: Some("recalled".to_string()),
                ..Default::default()
            };

            let (a, b) = tokio::join!(
                store.update_drug(drug.id, quantity),
                store.update_drug(drug.id, status)
            );
            a.unwrap().unwrap();
            b.unwrap().unwrap();

            let stored = store.get_drug(drug.id).await.unwrap().unwrap();
            assert_eq!(stored.quantity, 100 + round);
            assert_eq!(stored.status, "recalled");
            assert!(store.delete_drug(drug.id).await.unwrap());
        }
    }

    #[tokio::test]
    async fn patching_a_missing_drug_is_none() {
        let Some(store) = test_store().await else {
            eprintln!("TEST_DATABASE_URL not set, skipping");
            return;
        };
        let result = store.update_drug(i64::MAX, DrugPatch::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn connect_requires_configuration() {
        let config = PostgresConfig {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            database: "pharmatrack".to_string(),
            username: None,
            password: None,
            ssl_mode: "prefer".to_string(),
            max_connections: 1,
        };
        let err = PgStore::connect(&config).await.unwrap_err();
        assert!(matches!(err, StorageError::NotConfigured(_)));
    }
}
