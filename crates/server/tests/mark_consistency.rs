//! Integration tests for marks racing a user deletion.
//!
//! A gated user store pauses `rate` right after it looked its user up, which
//! is the widest window a concurrent delete could use to leave an orphan
//! mark behind.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use catalog::{Film, FilmStorage, InMemoryFilmStorage, InMemoryUserStorage, User, UserId, UserStorage};
use chrono::NaiveDate;
use server::{App, ServiceConfig};
use tokio::sync::Notify;

/// Pauses the first lookup of `gated` until released.
struct GatedUsers {
    inner: InMemoryUserStorage,
    gated: UserId,
    armed: AtomicBool,
    looked_up: Notify,
    release: Notify,
}

#[async_trait]
impl UserStorage for GatedUsers {
    async fn get_by_id(&self, id: UserId) -> catalog::Result<User> {
        let user = self.inner.get_by_id(id).await;
        if id == self.gated && self.armed.swap(false, Ordering::SeqCst) {
            self.looked_up.notify_one();
            self.release.notified().await;
        }
        user
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
        self.inner.add_friend_edge(from, to).await
    }

    async fn remove_friend_edge(&self, from: UserId, to: UserId) -> catalog::Result<()> {
        self.inner.remove_friend_edge(from, to).await
    }
}

fn user(id: UserId) -> User {
    User::new(
        id,
        format!("user{}@example.com", id),
        format!("user{}", id),
        "",
        NaiveDate::from_ymd_opt(1988, 10, 2).unwrap(),
    )
}

fn build_gated_app(gated: UserId) -> (Arc<App>, Arc<GatedUsers>, Arc<InMemoryFilmStorage>) {
    let users = Arc::new(GatedUsers {
        inner: InMemoryUserStorage::from_users((1..=2).map(user)),
        gated,
        armed: AtomicBool::new(false),
        looked_up: Notify::new(),
        release: Notify::new(),
    });
    let films = Arc::new(InMemoryFilmStorage::from_films([Film::new(
        1,
        "Playtime",
        NaiveDate::from_ymd_opt(1967, 12, 16).unwrap(),
        124,
    )]));
    let app = App::new(users.clone(), films.clone(), ServiceConfig::default());
    (Arc::new(app), users, films)
}

#[tokio::test]
async fn test_delete_waits_for_inflight_mark() {
    let (app, users, films) = build_gated_app(2);
    app.recommendations().model().await.unwrap();
    users.armed.store(true, Ordering::SeqCst);

    let rating = tokio::spawn({
        let app = Arc::clone(&app);
        async move { app.recommendations().rate(1, 2, 7).await }
    });
    users.looked_up.notified().await;

    let deletion = tokio::spawn({
        let app = Arc::clone(&app);
        async move { app.delete_user(2).await }
    });
    // Give the delete every chance to run ahead of the paused mark
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!deletion.is_finished());

    users.release.notify_one();
    rating.await.unwrap().unwrap();
    deletion.await.unwrap().unwrap();

    assert_eq!(films.get_by_id(1).await.unwrap().rating_count(), 0);
    let model = app.recommendations().model().await.unwrap();
    assert_eq!(model.ledger().rating_count(1), 0);
    assert!(app.accounts().get(2).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_mark_after_delete_is_rejected() {
    let (app, _users, films) = build_gated_app(2);

    app.delete_user(2).await.unwrap();

    assert!(app.recommendations().rate(1, 2, 7).await.unwrap_err().is_not_found());
    assert!(app.recommendations().unrate(1, 2).await.unwrap_err().is_not_found());
    assert_eq!(films.get_by_id(1).await.unwrap().rating_count(), 0);
}
