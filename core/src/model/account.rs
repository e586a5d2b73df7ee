use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageAccounts,
    TrackPresence,
}

/// Identity supplied by the authentication layer. Credentials never reach
/// the core; only `id` is used, as the storage scope key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl Account {
    pub fn new(id: impl Into<String>, username: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            role,
        }
    }
}

pub fn has_capability(account: &Account, capability: Capability) -> bool {
    match capability {
        Capability::ManageAccounts => account.role == Role::Admin,
        Capability::TrackPresence => true,
    }
}

/// Namespace under which an account's state is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageScope {
    Guest,
    Account(String),
}

impl StorageScope {
    pub fn for_account(account: Option<&Account>) -> Self {
        match account {
            Some(a) => StorageScope::Account(a.id.clone()),
            None => StorageScope::Guest,
        }
    }

    pub fn key(&self) -> String {
        match self {
            StorageScope::Guest => "guest".to_string(),
            StorageScope::Account(id) => format!("account-{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_by_role() {
        let admin = Account::new("a1", "root", Role::Admin);
        let user = Account::new("u1", "alice", Role::User);

        assert!(has_capability(&admin, Capability::ManageAccounts));
        assert!(has_capability(&admin, Capability::TrackPresence));
        assert!(!has_capability(&user, Capability::ManageAccounts));
        assert!(has_capability(&user, Capability::TrackPresence));
    }

    #[test]
    fn test_scope_keys() {
        let user = Account::new("u1", "alice", Role::User);
        assert_eq!(StorageScope::for_account(Some(&user)).key(), "account-u1");
        assert_eq!(StorageScope::for_account(None).key(), "guest");
        assert_ne!(StorageScope::Account("guest".into()).key(), StorageScope::Guest.key());
    }
}
