//! # Friend Graph Service
//!
//! Maintains the symmetric friend relation on top of a storage collaborator
//! that only knows directed edges.
//!
//! ## Consistency
//! A friendship is two edge writes. Mutations are serialized through one
//! async mutex so two requests touching the same pair can't interleave their
//! writes. Each mutation only writes the directions that are actually
//! missing (or present, for removal), so retrying a call that reported
//! [`ServiceError::PartialFailure`] finishes the job instead of repeating it.
//!
//! ## Error policy
//! `get_friends` fails on an unknown user. `get_mutual_friends` does not: an
//! unknown user simply has no friends in common with anyone.

use std::collections::HashSet;
use std::sync::Arc;

use catalog::{User, UserId, UserStorage};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{FriendOp, Result, ServiceError};

pub struct FriendGraph {
    users: Arc<dyn UserStorage>,
    mutations: Mutex<()>,
}

impl FriendGraph {
    pub fn new(users: Arc<dyn UserStorage>) -> Self {
        Self {
            users,
            mutations: Mutex::new(()),
        }
    }

    /// Make `a` and `b` friends in both directions.
    ///
    /// Adding an existing friendship again succeeds without writing anything.
    #[instrument(skip(self))]
    pub async fn add_friend(&self, a: UserId, b: UserId) -> Result<()> {
        if a == b {
            return Err(ServiceError::SelfFriendship(a));
        }
        let _guard = self.mutations.lock().await;

        let (user_a, user_b) = tokio::try_join!(self.users.get_by_id(a), self.users.get_by_id(b))?;
        let pending = [
            (a, b, !user_a.is_friend_with(b)),
            (b, a, !user_b.is_friend_with(a)),
        ];

        self.write_edges(FriendOp::Add, pending).await?;
        info!("Users {} and {} are friends", a, b);
        Ok(())
    }

    /// End the friendship between `a` and `b` in both directions.
    ///
    /// Both users must exist. Removing a friendship that isn't there (or
    /// removing it twice) succeeds without writing anything.
    #[instrument(skip(self))]
    pub async fn remove_friend(&self, a: UserId, b: UserId) -> Result<()> {
        let _guard = self.mutations.lock().await;

        let (user_a, user_b) = tokio::try_join!(self.users.get_by_id(a), self.users.get_by_id(b))?;
        let pending = [
            (a, b, user_a.is_friend_with(b)),
            (b, a, user_b.is_friend_with(a)),
        ];

        self.write_edges(FriendOp::Remove, pending).await?;
        info!("Users {} and {} are no longer friends", a, b);
        Ok(())
    }

    /// Apply the flagged directed edges in order.
    ///
    /// A failure is a clean one only if the relation is still symmetric
    /// afterwards: that is, the very first of two needed writes failed.
    async fn write_edges(&self, operation: FriendOp, edges: [(UserId, UserId, bool); 2]) -> Result<()> {
        let pending: Vec<(UserId, UserId)> = edges
            .iter()
            .filter(|(_, _, needed)| *needed)
            .map(|&(from, to, _)| (from, to))
            .collect();

        if pending.is_empty() {
            debug!("Nothing to write for {}", operation);
            return Ok(());
        }
        let symmetric_before = pending.len() == edges.len();

        for (idx, &(from, to)) in pending.iter().enumerate() {
            let written = match operation {
                FriendOp::Add => self.users.add_friend_edge(from, to).await,
                FriendOp::Remove => self.users.remove_friend_edge(from, to).await,
            };

            if let Err(source) = written {
                if symmetric_before && idx == 0 {
                    return Err(source.into());
                }
                warn!("{} left edge {} -> {} unwritten: {}", operation, from, to, source);
                return Err(ServiceError::PartialFailure {
                    operation,
                    from,
                    to,
                    source,
                });
            }
        }
        Ok(())
    }

    /// Friends of `id`, ordered by id. Fails if `id` is unknown.
    #[instrument(skip(self))]
    pub async fn get_friends(&self, id: UserId) -> Result<Vec<User>> {
        let user = self.users.get_by_id(id).await?;

        let mut ids: Vec<UserId> = user.friend_ids.into_iter().collect();
        ids.sort_unstable();

        let friends = self.load_users(ids).await;
        debug!("User {} has {} friends", id, friends.len());
        Ok(friends)
    }

    /// Friends `a` and `b` have in common, ordered by id.
    ///
    /// Unknown users and users without friends give an empty list.
    #[instrument(skip(self))]
    pub async fn get_mutual_friends(&self, a: UserId, b: UserId) -> Vec<User> {
        let (user_a, user_b) = tokio::join!(self.users.get_by_id(a), self.users.get_by_id(b));
        let (Ok(user_a), Ok(user_b)) = (user_a, user_b) else {
            debug!("Mutual friends of {} and {}: unknown user", a, b);
            return Vec::new();
        };

        let mut common = intersect(&user_a.friend_ids, &user_b.friend_ids);
        common.sort_unstable();

        self.load_users(common).await
    }

    /// Materialize users, skipping ids the store no longer knows.
    async fn load_users(&self, ids: Vec<UserId>) -> Vec<User> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            match self.users.get_by_id(id).await {
                Ok(user) => users.push(user),
                Err(e) => warn!("Skipping friend {}: {}", id, e),
            }
        }
        users
    }
}

/// Walk the smaller set and probe the larger one.
fn intersect(a: &HashSet<UserId>, b: &HashSet<UserId>) -> Vec<UserId> {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().copied().filter(|id| large.contains(id)).collect()
}
