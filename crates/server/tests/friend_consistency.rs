//! Integration tests for the friend graph's failure handling.
//!
//! The storage collaborator is replaced by mockall doubles (to script exactly
//! which edge write fails) or by a flaky wrapper around the in-memory store
//! (to check that a retry reconciles real state).

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use catalog::{CatalogError, InMemoryUserStorage, User, UserId, UserStorage};
use chrono::NaiveDate;
use mockall::mock;
use mockall::predicate::eq;
use server::{FriendGraph, FriendOp, ServiceError};

mock! {
    pub Users {}

    #[async_trait]
    impl UserStorage for Users {
        async fn get_by_id(&self, id: UserId) -> catalog::Result<User>;
        async fn get_all(&self) -> Vec<User>;
        async fn save(&self, user: User) -> catalog::Result<User>;
        async fn update(&self, user: User) -> catalog::Result<User>;
        async fn delete(&self, id: UserId) -> catalog::Result<()>;
        async fn add_friend_edge(&self, from: UserId, to: UserId) -> catalog::Result<()>;
        async fn remove_friend_edge(&self, from: UserId, to: UserId) -> catalog::Result<()>;
    }
}

// ============================================================================
// Test Fixtures
// ============================================================================

fn user(id: UserId, friends: &[UserId]) -> User {
    let mut user = User::new(
        id,
        format!("user{}@example.com", id),
        format!("user{}", id),
        "",
        NaiveDate::from_ymd_opt(1995, 8, 24).unwrap(),
    );
    user.friend_ids = friends.iter().copied().collect();
    user
}

fn storage_down() -> CatalogError {
    CatalogError::Storage("connection reset".to_string())
}

fn graph(users: MockUsers) -> FriendGraph {
    FriendGraph::new(Arc::new(users))
}

// ============================================================================
// Scripted failures
// ============================================================================

#[tokio::test]
async fn test_second_edge_failure_is_partial() {
    let mut users = MockUsers::new();
    users.expect_get_by_id().returning(|id| Ok(user(id, &[])));
    users
        .expect_add_friend_edge()
        .with(eq(1), eq(2))
        .times(1)
        .returning(|_, _| Ok(()));
    users
        .expect_add_friend_edge()
        .with(eq(2), eq(1))
        .times(1)
        .returning(|_, _| Err(storage_down()));

    let err = graph(users).add_friend(1, 2).await.unwrap_err();

    assert!(err.is_partial_failure());
    match err {
        ServiceError::PartialFailure {
            operation,
            from,
            to,
            source,
        } => {
            assert_eq!(operation, FriendOp::Add);
            assert_eq!((from, to), (2, 1));
            assert!(matches!(source, CatalogError::Storage(_)));
        }
        other => panic!("expected a partial failure, got {other}"),
    }
}

#[tokio::test]
async fn test_first_edge_failure_is_clean() {
    let mut users = MockUsers::new();
    users.expect_get_by_id().returning(|id| Ok(user(id, &[])));
    users
        .expect_add_friend_edge()
        .with(eq(1), eq(2))
        .times(1)
        .returning(|_, _| Err(storage_down()));
    users.expect_add_friend_edge().with(eq(2), eq(1)).never();

    let err = graph(users).add_friend(1, 2).await.unwrap_err();

    assert!(!err.is_partial_failure());
    assert!(matches!(err, ServiceError::Catalog(CatalogError::Storage(_))));
}

#[tokio::test]
async fn test_remove_second_edge_failure_is_partial() {
    let mut users = MockUsers::new();
    users
        .expect_get_by_id()
        .returning(|id| Ok(if id == 1 { user(1, &[2]) } else { user(id, &[1]) }));
    users
        .expect_remove_friend_edge()
        .with(eq(1), eq(2))
        .times(1)
        .returning(|_, _| Ok(()));
    users
        .expect_remove_friend_edge()
        .with(eq(2), eq(1))
        .times(1)
        .returning(|_, _| Err(storage_down()));

    let err = graph(users).remove_friend(1, 2).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::PartialFailure {
            operation: FriendOp::Remove,
            from: 2,
            to: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn test_existing_friendship_writes_nothing() {
    let mut users = MockUsers::new();
    users
        .expect_get_by_id()
        .returning(|id| Ok(if id == 1 { user(1, &[2]) } else { user(id, &[1]) }));
    users.expect_add_friend_edge().never();

    graph(users).add_friend(2, 1).await.unwrap();
}

#[tokio::test]
async fn test_retry_writes_only_the_missing_edge() {
    let mut users = MockUsers::new();
    // State left behind by a partial add: 1 -> 2 exists, 2 -> 1 doesn't
    users
        .expect_get_by_id()
        .returning(|id| Ok(if id == 1 { user(1, &[2]) } else { user(id, &[]) }));
    users.expect_add_friend_edge().with(eq(1), eq(2)).never();
    users
        .expect_add_friend_edge()
        .with(eq(2), eq(1))
        .times(1)
        .returning(|_, _| Ok(()));

    graph(users).add_friend(1, 2).await.unwrap();
}

#[tokio::test]
async fn test_failed_repair_is_still_partial() {
    let mut users = MockUsers::new();
    users
        .expect_get_by_id()
        .returning(|id| Ok(if id == 1 { user(1, &[2]) } else { user(id, &[]) }));
    users
        .expect_add_friend_edge()
        .with(eq(2), eq(1))
        .times(1)
        .returning(|_, _| Err(storage_down()));

    let err = graph(users).add_friend(1, 2).await.unwrap_err();
    assert!(err.is_partial_failure());
}

#[tokio::test]
async fn test_unknown_user_is_not_found_before_any_write() {
    let mut users = MockUsers::new();
    users.expect_get_by_id().with(eq(1)).returning(|id| Ok(user(id, &[])));
    users
        .expect_get_by_id()
        .with(eq(7))
        .returning(|id| Err(CatalogError::UserNotFound(id)));
    users.expect_add_friend_edge().never();

    let err = graph(users).add_friend(1, 7).await.unwrap_err();
    assert!(err.is_not_found());
}

// ============================================================================
// Retry against real state
// ============================================================================

/// In-memory store whose first write of one chosen edge fails.
struct FlakyUsers {
    inner: InMemoryUserStorage,
    flaky_edge: (UserId, UserId),
    tripped: AtomicBool,
}

impl FlakyUsers {
    fn new(users: impl IntoIterator<Item = User>, flaky_edge: (UserId, UserId)) -> Self {
        Self {
            inner: InMemoryUserStorage::from_users(users),
            flaky_edge,
            tripped: AtomicBool::new(false),
        }
    }

    fn trip(&self, from: UserId, to: UserId) -> catalog::Result<()> {
        if (from, to) == self.flaky_edge && !self.tripped.swap(true, Ordering::SeqCst) {
            return Err(storage_down());
        }
        Ok(())
    }
}

#[async_trait]
impl UserStorage for FlakyUsers {
    async fn get_by_id(&self, id: UserId) -> catalog::Result<User> {
        self.inner.get_by_id(id).await
    }

    async fn get_all(&self) -> Vec<User> {
        self.inner.get_all().await
    }

    async fn save(&self, user: User) -> catalog::Result<User> {
        self.inner.save(user).await
    }

    async fn update(&self, user: User) -> catalog::Result<User> {
        self.inner.update(user).await
    }

    async fn delete(&self, id: UserId) -> catalog::Result<()> {
        self.inner.delete(id).await
    }

    async fn add_friend_edge(&self, from: UserId, to: UserId) -> catalog::Result<()> {
        self.trip(from, to)?;
        self.inner.add_friend_edge(from, to).await
    }

    async fn remove_friend_edge(&self, from: UserId, to: UserId) -> catalog::Result<()> {
        self.trip(from, to)?;
        self.inner.remove_friend_edge(from, to).await
    }
}

fn friend_set(user: &User) -> HashSet<UserId> {
    user.friend_ids.clone()
}

#[tokio::test]
async fn test_retry_after_partial_add_reconciles() {
    let storage = Arc::new(FlakyUsers::new([user(1, &[]), user(2, &[])], (2, 1)));
    let graph = FriendGraph::new(storage.clone());

    let err = graph.add_friend(1, 2).await.unwrap_err();
    assert!(err.is_partial_failure());
    assert!(storage.get_by_id(1).await.unwrap().is_friend_with(2));
    assert!(!storage.get_by_id(2).await.unwrap().is_friend_with(1));

    graph.add_friend(1, 2).await.unwrap();
    assert_eq!(friend_set(&storage.get_by_id(1).await.unwrap()), HashSet::from([2]));
    assert_eq!(friend_set(&storage.get_by_id(2).await.unwrap()), HashSet::from([1]));
}

#[tokio::test]
async fn test_retry_after_partial_remove_reconciles() {
    let storage = Arc::new(FlakyUsers::new([user(1, &[2]), user(2, &[1])], (2, 1)));
    let graph = FriendGraph::new(storage.clone());

    assert!(graph.remove_friend(1, 2).await.unwrap_err().is_partial_failure());

    graph.remove_friend(1, 2).await.unwrap();
    assert!(storage.get_by_id(1).await.unwrap().friend_ids.is_empty());
    assert!(storage.get_by_id(2).await.unwrap().friend_ids.is_empty());
}
