//! Persistence capability consumed by the HTTP layer and the alert scheduler.

use async_trait::async_trait;

use pharmatrack_core::{
    Account, AccountId, Drug, DrugId, DrugPatch, NewAccountRecord, NewDrug,
};

use crate::error::StorageError;

#[async_trait]
pub trait Repository: Send + Sync {
    /// Every tracked drug, in id order.
    async fn list_drugs(&self) -> Result<Vec<Drug>, StorageError>;

    async fn get_drug(&self, id: DrugId) -> Result<Option<Drug>, StorageError>;

    /// Store a validated drug; assigns the id, `active` status and creation time.
    async fn create_drug(&self, drug: NewDrug) -> Result<Drug, StorageError>;

    /// Apply a partial update. `None` when the drug does not exist.
    async fn update_drug(&self, id: DrugId, patch: DrugPatch) -> Result<Option<Drug>, StorageError>;

    /// Returns whether a drug was removed.
    async fn delete_drug(&self, id: DrugId) -> Result<bool, StorageError>;

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StorageError>;

    async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>, StorageError>;

    /// Fails with [`StorageError::Duplicate`] when the username is taken.
    async fn create_account(&self, account: NewAccountRecord) -> Result<Account, StorageError>;

    /// Active accounts opted in to email alerts with a non-empty address.
    async fn list_notifiable_accounts(&self) -> Result<Vec<Account>, StorageError>;

    async fn set_email_notifications(
        &self,
        id: AccountId,
        enabled: bool,
    ) -> Result<Option<Account>, StorageError>;

    /// Short backend name for health and startup logs.
    fn backend_name(&self) -> &'static str;
}
