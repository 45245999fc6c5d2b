//! In-memory [`Repository`] backed by ordered maps.
//!
//! Used when PostgreSQL is not configured, and by tests as the default
//! test double. Contents are lost on restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use pharmatrack_core::{
    Account, AccountId, Drug, DrugId, DrugPatch, NewAccountRecord, NewDrug,
};

use crate::error::StorageError;
use crate::repository::Repository;

#[derive(Debug, Default)]
struct Inner {
    drugs: BTreeMap<DrugId, Drug>,
    accounts: BTreeMap<AccountId, Account>,
    last_drug_id: DrugId,
    last_account_id: AccountId,
}

/// Thread-safe in-memory store with sequential ids starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a drug exactly as given, bypassing validation.
    ///
    /// Used to load data that was not created through the API.
    pub async fn insert_drug(&self, drug: Drug) {
        let mut inner = self.inner.write().await;
        inner.last_drug_id = inner.last_drug_id.max(drug.id);
        inner.drugs.insert(drug.id, drug);
    }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn list_drugs(&self) -> Result<Vec<Drug>, StorageError> {
        Ok(self.inner.read().await.drugs.values().cloned().collect())
    }

    async fn get_drug(&self, id: DrugId) -> Result<Option<Drug>, StorageError> {
        Ok(self.inner.read().await.drugs.get(&id).cloned())
    }

    async fn create_drug(&self, drug: NewDrug) -> Result<Drug, StorageError> {
        let mut inner = self.inner.write().await;
        inner.last_drug_id += 1;
        let drug = drug.into_drug(inner.last_drug_id, Utc::now());
        inner.drugs.insert(drug.id, drug.clone());
        Ok(drug)
    }

    async fn update_drug(&self, id: DrugId, patch: DrugPatch) -> Result<Option<Drug>, StorageError> {
        let mut inner = self.inner.write().await;
        Ok(inner.drugs.get_mut(&id).map(|drug| {
            patch.apply(drug);
            drug.clone()
        }))
    }

    async fn delete_drug(&self, id: DrugId) -> Result<bool, StorageError> {
        Ok(self.inner.write().await.drugs.remove(&id).is_some())
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StorageError> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn create_account(&self, account: NewAccountRecord) -> Result<Account, StorageError> {
        let mut inner = self.inner.write().await;
        if inner.accounts.values().any(|a| a.username == account.username) {
            return Err(StorageError::Duplicate {
                kind: "username",
                value: account.username,
            });
        }
        inner.last_account_id += 1;
        let created = Account {
            id: inner.last_account_id,
            username: account.username,
            password_hash: account.password_hash,
            email: account.email,
            role: account.role,
            is_active: true,
            email_notifications: true,
        };
        inner.accounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_notifiable_accounts(&self) -> Result<Vec<Account>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .accounts
            .values()
            .filter(|a| a.is_notifiable())
            .cloned()
            .collect())
    }

    async fn set_email_notifications(
        &self,
        id: AccountId,
        enabled: bool,
    ) -> Result<Option<Account>, StorageError> {
        let mut inner = self.inner.write().await;
        Ok(inner.accounts.get_mut(&id).map(|account| {
            account.email_notifications = enabled;
            account.clone()
        }))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmatrack_core::Role;

    fn new_drug(brand: &str, expiration: &str) -> NewDrug {
        NewDrug {
            generic_name: "ibuprofen".to_string(),
            brand_name: brand.to_string(),
            manufacturer: "Acme".to_string(),
            batch_number: "B1".to_string(),
            expiration_date: expiration.to_string(),
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

    fn new_account(username: &str, email: Option<&str>) -> NewAccountRecord {
        NewAccountRecord {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            email: email.map(str::to_string),
            role: Role::Pharmacist,
        }
    }

    #[tokio::test]
    async fn drug_crud_roundtrip() {
        let store = MemoryStore::new();
        let a = store.create_drug(new_drug("A", "2024-05")).await.unwrap();
        let b = store.create_drug(new_drug("B", "2024-06")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(a.status, "active");

        let patch = DrugPatch {
            quantity: Some(3),
            ..Default::default()
        };
        let updated = store.update_drug(a.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.quantity, 3);
        assert_eq!(store.get_drug(a.id).await.unwrap().unwrap().quantity, 3);

        assert!(store.update_drug(42, DrugPatch::default()).await.unwrap().is_none());

        assert!(store.delete_drug(a.id).await.unwrap());
        assert!(!store.delete_drug(a.id).await.unwrap());
        let ids: Vec<DrugId> = store.list_drugs().await.unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        let a = store.create_drug(new_drug("A", "2024-05")).await.unwrap();
        store.delete_drug(a.id).await.unwrap();
        let b = store.create_drug(new_drug("B", "2024-05")).await.unwrap();
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn insert_drug_advances_ids() {
        let store = MemoryStore::new();
        let seeded = new_drug("Seeded", "garbage").into_drug(10, Utc::now());
        store.insert_drug(seeded).await;
        let next = store.create_drug(new_drug("Next", "2024-05")).await.unwrap();
        assert_eq!(next.id, 11);
        assert_eq!(store.get_drug(10).await.unwrap().unwrap().expiration_date, "garbage");
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let store = MemoryStore::new();
        store.create_account(new_account("alice", None)).await.unwrap();
        let err = store.create_account(new_account("alice", None)).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { kind: "username", .. }));
    }

    #[tokio::test]
    async fn notifiable_accounts_follow_preferences() {
        let store = MemoryStore::new();
        let alice = store
            .create_account(new_account("alice", Some("alice@example.com")))
            .await
            .unwrap();
        store.create_account(new_account("bob", None)).await.unwrap();
        let carol = store
            .create_account(new_account("carol", Some("carol@example.com")))
            .await
            .unwrap();

        assert!(alice.email_notifications && alice.is_active);
        let names = |accounts: Vec<Account>| -> Vec<String> {
            accounts.into_iter().map(|a| a.username).collect()
        };
        assert_eq!(
            names(store.list_notifiable_accounts().await.unwrap()),
            vec!["alice", "carol"]
        );

        let updated = store.set_email_notifications(carol.id, false).await.unwrap().unwrap();
        assert!(!updated.email_notifications);
        assert_eq!(names(store.list_notifiable_accounts().await.unwrap()), vec!["alice"]);

        assert!(store.set_email_notifications(99, true).await.unwrap().is_none());
        assert_eq!(
            store.get_account_by_username("bob").await.unwrap().unwrap().id,
            2
        );
    }
}
