//! In-memory fakes for the external identity and store capabilities.
//! Compiled for unit tests and the `test-utils` feature only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::question::{Question, QuestionDraft, QuestionError};
use crate::identity::{
    IdentityError, IdentityProvider, Principal, ProfileUpdate, UserSummary,
};
use crate::services::profile_service::{ProfileError, ProfileStore};
use crate::services::question_service::QuestionStore;

/// Identity provider backed by in-memory maps. Tokens are opaque strings
/// issued by the fixture; verification resolves the current user record,
/// so role changes show up on the next request.
#[derive(Default)]
pub struct MockIdentityProvider {
    users: Mutex<HashMap<String, UserSummary>>,
    tokens: Mutex<HashMap<String, String>>,
    token_counter: AtomicU64,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: UserSummary) {
        self.users.lock().unwrap().insert(user.uid.clone(), user);
    }

    pub fn issue_token(&self, uid: &str) -> String {
        let n = self.token_counter.fetch_add(1, Ordering::Relaxed);
        let token = format!("tok-{uid}-{n}");
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), uid.to_string());
        token
    }

    /// Register a user with the given roles and hand back a valid token.
    pub fn seed_user(&self, uid: &str, roles: &[&str]) -> String {
        self.insert_user(UserSummary {
            uid: uid.to_string(),
            email: Some(format!("{uid}@example.com")),
            display_name: Some(format!("User {uid}")),
            photo_url: None,
            email_verified: true,
            disabled: false,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        });
        self.issue_token(uid)
    }

    pub fn user(&self, uid: &str) -> Option<UserSummary> {
        self.users.lock().unwrap().get(uid).cloned()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<Principal, IdentityError> {
        let uid = self
            .tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::InvalidToken("unknown token".to_string()))?;
        let user = self
            .user(&uid)
            .ok_or_else(|| IdentityError::InvalidToken("token for unknown user".to_string()))?;
        Ok(Principal {
            uid: user.uid,
            email: user.email,
            email_verified: user.email_verified,
            display_name: user.display_name,
            roles: user.roles,
        })
    }

    async fn get_user(&self, uid: &str) -> Result<UserSummary, IdentityError> {
        self.user(uid)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))
    }

    async fn list_users(&self, limit: usize) -> Result<Vec<UserSummary>, IdentityError> {
        let users = self.users.lock().unwrap();
        let mut all: Vec<UserSummary> = users.values().cloned().collect();
        all.sort_by(|a, b| a.uid.cmp(&b.uid));
        all.truncate(limit);
        Ok(all)
    }

    async fn get_roles(&self, uid: &str) -> Result<Vec<String>, IdentityError> {
        Ok(self.get_user(uid).await?.roles)
    }

    async fn set_roles(&self, uid: &str, roles: Vec<String>) -> Result<(), IdentityError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(uid)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))?;
        user.roles = roles;
        Ok(())
    }

    async fn set_disabled(&self, uid: &str, disabled: bool) -> Result<(), IdentityError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(uid)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))?;
        user.disabled = disabled;
        Ok(())
    }

    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> Result<(), IdentityError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(uid)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))?;
        if let Some(name) = update.display_name {
            user.display_name = Some(name);
        }
        if let Some(url) = update.photo_url {
            user.photo_url = Some(url);
        }
        Ok(())
    }
}

/// Question store over a Vec, mirroring the Postgres implementation's
/// semantics: per-owner short-name uniqueness, ownership-or-not-found,
/// creation-order-descending listing.
#[derive(Default)]
pub struct MemoryQuestionStore {
    items: Mutex<Vec<Question>>,
}

impl MemoryQuestionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionStore for MemoryQuestionStore {
    async fn list(&self, owner: &str) -> Result<Vec<Question>, QuestionError> {
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|q| q.owner == owner)
            .rev()
            .cloned()
            .collect())
    }

    async fn create(&self, owner: &str, draft: QuestionDraft) -> Result<Question, QuestionError> {
        let new = draft.validate()?;

        let mut items = self.items.lock().unwrap();
        if items
            .iter()
            .any(|q| q.owner == owner && q.short_name == new.short_name)
        {
            return Err(QuestionError::DuplicateShortName);
        }

        let now = Utc::now();
        let question = Question {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            short_name: new.short_name,
            class: new.class,
            prompt: new.prompt,
            value_type: new.value_type,
            created_at: now,
            updated_at: now,
        };
        items.push(question.clone());
        Ok(question)
    }

    async fn update(
        &self,
        owner: &str,
        id: Uuid,
        draft: QuestionDraft,
    ) -> Result<Question, QuestionError> {
        let new = draft.validate()?;

        let mut items = self.items.lock().unwrap();
        if !items.iter().any(|q| q.id == id && q.owner == owner) {
            return Err(QuestionError::NotFound);
        }
        if items
            .iter()
            .any(|q| q.owner == owner && q.id != id && q.short_name == new.short_name)
        {
            return Err(QuestionError::DuplicateShortName);
        }

        let question = items
            .iter_mut()
            .find(|q| q.id == id && q.owner == owner)
            .ok_or(QuestionError::NotFound)?;

        question.short_name = new.short_name;
        question.class = new.class;
        question.prompt = new.prompt;
        question.value_type = new.value_type;
        question.updated_at = Utc::now();
        Ok(question.clone())
    }

    async fn delete(&self, owner: &str, id: Uuid) -> Result<(), QuestionError> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|q| !(q.id == id && q.owner == owner));
        if items.len() == before {
            return Err(QuestionError::NotFound);
        }
        Ok(())
    }

    async fn count_unowned(&self) -> Result<i64, QuestionError> {
        let items = self.items.lock().unwrap();
        Ok(items.iter().filter(|q| q.owner.is_empty()).count() as i64)
    }
}

/// Profile store over a HashMap with shallow-merge semantics.
#[derive(Default)]
pub struct MemoryProfileStore {
    docs: Mutex<HashMap<String, Value>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn fetch(&self, uid: &str) -> Result<Option<Value>, ProfileError> {
        Ok(self.docs.lock().unwrap().get(uid).cloned())
    }

    async fn merge(&self, uid: &str, data: Value) -> Result<(), ProfileError> {
        let mut docs = self.docs.lock().unwrap();
        let entry = docs
            .entry(uid.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        if let (Value::Object(existing), Value::Object(incoming)) = (entry, data) {
            for (key, value) in incoming {
                existing.insert(key, value);
            }
        }
        Ok(())
    }
}

/// App state wired entirely to fakes, plus a handle to the identity
/// fixture for seeding users and minting tokens.
pub fn test_state() -> (AppState, Arc<MockIdentityProvider>) {
    let identity = Arc::new(MockIdentityProvider::new());
    let state = AppState {
        identity: identity.clone(),
        questions: Arc::new(MemoryQuestionStore::new()),
        profiles: Arc::new(MemoryProfileStore::new()),
    };
    (state, identity)
}
