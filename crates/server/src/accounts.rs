//! Account creation shared by the register endpoint and `create-user`.

use pharmatrack_core::password::hash_password;
use pharmatrack_core::{Account, CoreError, NewAccount, NewAccountRecord};
use pharmatrack_notify::parse_recipient;
use pharmatrack_storage::{Repository, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum CreateAccountError {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Hashing failed; nothing was stored.
    #[error("could not hash password: {0}")]
    Hashing(CoreError),
}

/// Validate `req`, hash its password and store the account.
///
/// The email must also be addressable by the alert mailer, so accounts
/// that could never receive an alert are refused up front.
pub async fn create_account(
    repo: &dyn Repository,
    req: NewAccount,
) -> Result<Account, CreateAccountError> {
    let role = req.validate()?;
    let email = req.email.trim();
    parse_recipient(email).map_err(|_| CoreError::InvalidEmail(req.email.clone()))?;
    let password_hash = hash_password(&req.password).map_err(CreateAccountError::Hashing)?;

    let record = NewAccountRecord {
        username: req.username.trim().to_string(),
        password_hash,
        email: Some(email.to_string()),
        role,
    };
    Ok(repo.create_account(record).await?)
}

#[cfg(test)]
mod tests {
    use pharmatrack_core::password::verify_password;
    use pharmatrack_core::Role;
    use pharmatrack_storage::MemoryStore;

    use super::*;

    fn request(username: &str, role: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            password: "secret1".to_string(),
            email: format!("{username}@pharmacy.example"),
            role: role.to_string(),
        }
    }

    #[tokio::test]
    async fn stores_a_hashed_password() {
        let store = MemoryStore::new();
        let account = create_account(&store, request("ana", "Pharmacist")).await.unwrap();
        assert_eq!(account.role, Role::Pharmacist);
        assert_ne!(account.password_hash, "secret1");
        assert!(account.password_hash.starts_with("$argon2id$"));
        assert!(verify_password("secret1", &account.password_hash));
        assert_eq!(account.email.as_deref(), Some("ana@pharmacy.example"));
    }

    #[tokio::test]
    async fn rejects_unknown_roles_and_duplicates() {
        let store = MemoryStore::new();
        let err = create_account(&store, request("ana", "owner")).await.unwrap_err();
        assert!(matches!(err, CreateAccountError::Invalid(CoreError::InvalidRole(_))));

        create_account(&store, request("ana", "admin")).await.unwrap();
        let err = create_account(&store, request("ana", "admin")).await.unwrap_err();
        assert!(matches!(err, CreateAccountError::Storage(StorageError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn rejects_addresses_the_mailer_cannot_use() {
        let store = MemoryStore::new();
        for email in ["bad(local@example.com", "semi;colon@example.com", "ops@exa mple.com"] {
            let mut req = request("ana", "pharmacist");
            req.email = email.to_string();
            let err = create_account(&store, req).await.unwrap_err();
            assert!(
                matches!(err, CreateAccountError::Invalid(CoreError::InvalidEmail(_))),
                "accepted {email:?}"
            );
        }
        assert!(store.get_account_by_username("ana").await.unwrap().is_none());
    }
}
