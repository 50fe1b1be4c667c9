use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use parking_lot::RwLock;

use crate::domains::auth::models::{NewRefreshCredential, RefreshCredential, User, UserUpdate};
use crate::shared::database::store::{CredentialStore, StoreError};
use crate::shared::utils::Clock;

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    credentials: HashMap<String, RefreshCredential>,
    next_user_id: i64,
    next_credential_id: i64,
}

impl Inner {
    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn insert_credential(
        &mut self,
        data: NewRefreshCredential,
        clock: &dyn Clock,
    ) -> Result<RefreshCredential, StoreError> {
        if self.credentials.contains_key(&data.token_hash) {
            return Err(StoreError::Duplicate { field: "token" });
        }

        self.next_credential_id += 1;
        let now = clock.now();
        let credential = RefreshCredential {
            id: self.next_credential_id,
            user_id: data.user_id,
            token_hash: data.token_hash,
            expires_at: now + Duration::days(data.ttl_days),
            created_at: now,
            is_revoked: false,
            user_agent: data.user_agent,
            origin_address: data.origin_address,
        };

        self.credentials
            .insert(credential.token_hash.clone(), credential.clone());
        Ok(credential)
    }
}

/// 메모리 기반 인증 저장소
/// In-process credential store.
///
/// Used by the test suites and by the server when no `DATABASE_URL` is
/// configured. Every operation runs under one lock acquisition, which
/// gives the same per-operation atomicity the Postgres store gets from
/// its transactions.
pub struct InMemoryCredentialStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCredentialStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }

    pub fn user_count(&self) -> usize {
        self.inner.read().users.len()
    }

    /// 사용자의 모든 Refresh Token (무효화/만료 포함), 생성 순
    /// Every credential ever issued to a user, oldest first
    pub fn credentials_for_user(&self, user_id: i64) -> Vec<RefreshCredential> {
        let mut credentials: Vec<RefreshCredential> = self
            .inner
            .read()
            .credentials
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        credentials.sort_by_key(|c| (c.created_at, c.id));
        credentials
    }

    /// Flip the admin flag; there is no HTTP surface for this
    pub fn set_admin(&self, user_id: i64, is_admin: bool) -> bool {
        match self.inner.write().users.get_mut(&user_id) {
            Some(user) => {
                user.is_admin = is_admin;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.write();

        if inner.username_taken(username, None) {
            return Err(StoreError::Duplicate { field: "username" });
        }
        if inner.email_taken(email, None) {
            return Err(StoreError::Duplicate { field: "email" });
        }

        inner.next_user_id += 1;
        let now = self.clock.now();
        let user = User {
            id: inner.next_user_id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            is_admin: false,
            created_at: now,
            updated_at: now,
        };

        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write();

        if !inner.users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(username) = &update.username {
            if inner.username_taken(username, Some(id)) {
                return Err(StoreError::Duplicate { field: "username" });
            }
        }
        if let Some(email) = &update.email {
            if inner.email_taken(email, Some(id)) {
                return Err(StoreError::Duplicate { field: "email" });
            }
        }

        let now = self.clock.now();
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = &update.username {
            user.username = username.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        user.updated_at = now;

        Ok(Some(user.clone()))
    }

    async fn deactivate_user(&self, id: i64) -> Result<bool, StoreError> {
        let now = self.clock.now();
        match self.inner.write().users.get_mut(&id) {
            Some(user) => {
                user.is_active = false;
                user.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_refresh_credential(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshCredential>, StoreError> {
        Ok(self.inner.read().credentials.get(token_hash).cloned())
    }

    async fn create_refresh_credential(
        &self,
        data: NewRefreshCredential,
    ) -> Result<RefreshCredential, StoreError> {
        self.inner.write().insert_credential(data, self.clock.as_ref())
    }

    async fn revoke_refresh_credential(&self, token_hash: &str) -> Result<(), StoreError> {
        if let Some(credential) = self.inner.write().credentials.get_mut(token_hash) {
            credential.is_revoked = true;
        }
        Ok(())
    }

    async fn rotate_refresh_credential(
        &self,
        old_token_hash: &str,
        data: NewRefreshCredential,
    ) -> Result<Option<RefreshCredential>, StoreError> {
        let now = self.clock.now();
        let mut inner = self.inner.write();

        match inner.credentials.get(old_token_hash) {
            Some(old) if old.is_active_at(now) => {}
            _ => return Ok(None),
        }
        if inner.credentials.contains_key(&data.token_hash) {
            return Err(StoreError::Duplicate { field: "token" });
        }

        if let Some(old) = inner.credentials.get_mut(old_token_hash) {
            old.is_revoked = true;
        }
        inner.insert_credential(data, self.clock.as_ref()).map(Some)
    }

    async fn list_active_refresh_credentials(
        &self,
        user_id: i64,
    ) -> Result<Vec<RefreshCredential>, StoreError> {
        let now = self.clock.now();
        let mut active: Vec<RefreshCredential> = self
            .inner
            .read()
            .credentials
            .values()
            .filter(|c| c.user_id == user_id && c.is_active_at(now))
            .cloned()
            .collect();
        active.sort_by_key(|c| (c.created_at, c.id));
        Ok(active)
    }

    async fn revoke_all_refresh_credentials(&self, user_id: i64) -> Result<u64, StoreError> {
        let now = self.clock.now();
        let mut revoked = 0;
        for credential in self.inner.write().credentials.values_mut() {
            if credential.user_id == user_id && credential.is_active_at(now) {
                credential.is_revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}
