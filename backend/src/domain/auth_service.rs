use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::domain::errors::DomainError;
use crate::storage::DataStore;
use shared::{LoginRequest, UserProfile};

/// Sign-in facade over the store's auth provider
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn DataStore>,
}

impl AuthService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<UserProfile> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(DomainError::validation("Email and password are required").into());
        }
        info!("Login attempt for {}", request.email.trim());
        self.store.sign_in(&request.email, &request.password).await
    }

    pub async fn logout(&self) -> Result<()> {
        info!("Logging out current user");
        self.store.sign_out().await
    }

    pub async fn current_user(&self) -> Result<Option<UserProfile>> {
        self.store.current_user().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StoreError};

    fn login(email: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: "any-password".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_logout_cycle() {
        let service = AuthService::new(Arc::new(MemoryStore::init_test()));

        let profile = service.login(login("Tutor@TutorHub.dev")).await.unwrap();
        assert_eq!(profile.role, "tutor");
        assert_eq!(service.current_user().await.unwrap(), Some(profile));

        service.logout().await.unwrap();
        assert_eq!(service.current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_rejects_unknown_and_blank() {
        let service = AuthService::new(Arc::new(MemoryStore::init_test()));

        let err = service.login(login("stranger@example.com")).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::UserNotFound(_))));

        let err = service.login(login("  ")).await.unwrap_err();
        assert!(err.downcast_ref::<DomainError>().is_some());
    }
}
