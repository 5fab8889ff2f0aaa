//! In-memory mock implementations for users, stores and store documents.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::paginate;
use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        Page, PageRequest,
        document::{DocumentRepo, NewDocument},
        store::{NewStore, StoreFilter, StoreProfileUpdate, StoreRepo},
        user::{NewUser, UserFilter, UserRepo},
    },
    domain::entities::{
        document::{DocumentStatus, StoreDocument},
        store::{Store, StoreStatus},
        subscription_plan::PlanTier,
        user::{Role, User, UserStatus},
    },
};

// ============================================================================
// InMemoryUserRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepo {
    pub users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut User)) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or(AppError::NotFound)?;
        f(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn create(&self, new: &NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == new.email) {
            return Err(AppError::Conflict("email already registered".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            role: new.role,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> AppResult<Page<User>> {
        let search = filter.search.as_deref().map(str::to_lowercase);
        let mut users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| filter.role.is_none_or(|r| u.role == r))
            .filter(|u| filter.status.is_none_or(|s| u.status == s))
            .filter(|u| {
                search.as_deref().is_none_or(|q| {
                    u.name.to_lowercase().contains(q) || u.email.contains(q)
                })
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(users, page))
    }

    async fn set_role(&self, id: Uuid, role: Role) -> AppResult<User> {
        self.update(id, |u| u.role = role)
    }

    async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<User> {
        self.update(id, |u| u.status = status)
    }
}

// ============================================================================
// InMemoryStoreRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryStoreRepo {
    pub stores: Mutex<HashMap<Uuid, Store>>,
}

impl InMemoryStoreRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stores(stores: Vec<Store>) -> Self {
        Self {
            stores: Mutex::new(stores.into_iter().map(|s| (s.id, s)).collect()),
        }
    }

    pub fn get_all(&self) -> Vec<Store> {
        self.stores.lock().unwrap().values().cloned().collect()
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut Store)) -> AppResult<Store> {
        let mut stores = self.stores.lock().unwrap();
        let store = stores.get_mut(&id).ok_or(AppError::NotFound)?;
        f(store);
        store.updated_at = Utc::now();
        Ok(store.clone())
    }
}

#[async_trait]
impl StoreRepo for InMemoryStoreRepo {
    async fn create(&self, new: &NewStore) -> AppResult<Store> {
        let mut stores = self.stores.lock().unwrap();
        if stores
            .values()
            .any(|s| s.owner_id == new.owner_id || s.slug == new.slug)
        {
            return Err(AppError::Conflict("store already exists".into()));
        }
        let now = Utc::now();
        let store = Store {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            name: new.name.clone(),
            slug: new.slug.clone(),
            description: new.description.clone(),
            phone: new.phone.clone(),
            address: new.address.clone(),
            logo_path: None,
            status: StoreStatus::Pending,
            current_plan: PlanTier::Basic,
            rejection_reason: None,
            verified_at: None,
            created_at: now,
            updated_at: now,
        };
        stores.insert(store.id, store.clone());
        Ok(store)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Store>> {
        Ok(self.stores.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_owner(&self, owner_id: Uuid) -> AppResult<Option<Store>> {
        Ok(self
            .stores
            .lock()
            .unwrap()
            .values()
            .find(|s| s.owner_id == owner_id)
            .cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> AppResult<Option<Store>> {
        Ok(self
            .stores
            .lock()
            .unwrap()
            .values()
            .find(|s| s.slug == slug)
            .cloned())
    }

    async fn update_profile(&self, id: Uuid, update: &StoreProfileUpdate) -> AppResult<Store> {
        self.update(id, |s| {
            if let Some(name) = &update.name {
                s.name = name.clone();
            }
            if update.description.is_some() {
                s.description = update.description.clone();
            }
            if update.phone.is_some() {
                s.phone = update.phone.clone();
            }
            if update.address.is_some() {
                s.address = update.address.clone();
            }
        })
    }

    async fn set_logo(&self, id: Uuid, logo_path: &str) -> AppResult<Store> {
        self.update(id, |s| s.logo_path = Some(logo_path.to_string()))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: StoreStatus,
        reason: Option<&str>,
    ) -> AppResult<Store> {
        self.update(id, |s| {
            s.status = status;
            s.rejection_reason = reason.map(String::from);
            if status == StoreStatus::Verified {
                s.verified_at = Some(Utc::now());
            }
        })
    }

    async fn set_current_plan(&self, id: Uuid, plan: PlanTier) -> AppResult<()> {
        self.update(id, |s| s.current_plan = plan).map(|_| ())
    }

    async fn list(&self, filter: &StoreFilter, page: PageRequest) -> AppResult<Page<Store>> {
        let search = filter.search.as_deref().map(str::to_lowercase);
        let mut stores: Vec<Store> = self
            .stores
            .lock()
            .unwrap()
            .values()
            .filter(|s| filter.status.is_none_or(|st| s.status == st))
            .filter(|s| {
                search
                    .as_deref()
                    .is_none_or(|q| s.name.to_lowercase().contains(q))
            })
            .cloned()
            .collect();
        stores.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(stores, page))
    }
}

// ============================================================================
// InMemoryDocumentRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryDocumentRepo {
    pub documents: Mutex<HashMap<Uuid, StoreDocument>>,
}

impl InMemoryDocumentRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<StoreDocument>) -> Self {
        Self {
            documents: Mutex::new(documents.into_iter().map(|d| (d.id, d)).collect()),
        }
    }
}

#[async_trait]
impl DocumentRepo for InMemoryDocumentRepo {
    async fn create(&self, new: &NewDocument) -> AppResult<StoreDocument> {
        let doc = StoreDocument {
            id: Uuid::new_v4(),
            store_id: new.store_id,
            doc_type: new.doc_type,
            file_path: new.file_path.clone(),
            status: DocumentStatus::Pending,
            review_note: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        };
        self.documents.lock().unwrap().insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<StoreDocument>> {
        Ok(self.documents.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_store(&self, store_id: Uuid) -> AppResult<Vec<StoreDocument>> {
        let mut docs: Vec<StoreDocument> = self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.store_id == store_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn list(
        &self,
        status: Option<DocumentStatus>,
        page: PageRequest,
    ) -> AppResult<Page<StoreDocument>> {
        let mut docs: Vec<StoreDocument> = self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|d| status.is_none_or(|s| d.status == s))
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(docs, page))
    }

    async fn review(
        &self,
        id: Uuid,
        status: DocumentStatus,
        reviewer_id: Uuid,
        note: Option<&str>,
    ) -> AppResult<Option<StoreDocument>> {
        let mut docs = self.documents.lock().unwrap();
        match docs.get_mut(&id) {
            Some(doc) if doc.status == DocumentStatus::Pending => {
                doc.status = status;
                doc.reviewed_by = Some(reviewer_id);
                doc.reviewed_at = Some(Utc::now());
                doc.review_note = note.map(String::from);
                Ok(Some(doc.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_document, create_test_store, create_test_user};

    #[tokio::test]
    async fn test_user_list_filters() {
        let buyer = create_test_user(|u| u.name = "Bea Buyer".into());
        let seller = create_test_user(|u| {
            u.name = "Sam Seller".into();
            u.role = Role::Seller;
        });
        let repo = InMemoryUserRepo::with_users(vec![buyer, seller.clone()]);

        let sellers = repo
            .list(
                &UserFilter {
                    role: Some(Role::Seller),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(sellers.total, 1);
        assert_eq!(sellers.items[0].id, seller.id);

        let search = repo
            .list(
                &UserFilter {
                    search: Some("bea".into()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(search.total, 1);
    }

    #[tokio::test]
    async fn test_store_per_owner_is_unique() {
        let owner = Uuid::new_v4();
        let repo = InMemoryStoreRepo::with_stores(vec![create_test_store(owner, |_| {})]);
        let result = repo
            .create(&NewStore {
                owner_id: owner,
                name: "Another".into(),
                slug: "another".into(),
                description: None,
                phone: None,
                address: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_document_review_only_once() {
        let doc = create_test_document(Uuid::new_v4(), |_| {});
        let repo = InMemoryDocumentRepo::with_documents(vec![doc.clone()]);
        let reviewer = Uuid::new_v4();

        let first = repo
            .review(doc.id, DocumentStatus::Approved, reviewer, None)
            .await
            .unwrap();
        assert!(first.is_some());

        let second = repo
            .review(doc.id, DocumentStatus::Rejected, reviewer, Some("late"))
            .await
            .unwrap();
        assert!(second.is_none());
    }
}
