//! The vote reconciler: at most one like or dislike per (user, target).

use tracing::{debug, info};

use super::Repositories;
use crate::domain::{VoteAction, VoteKind, VoteTarget, reconcile};
use crate::error::{DomainError, RepoError};
use crate::policy::{self, ContentSnapshot};
use crate::viewer::Viewer;
use crate::views::VoteRow;

const VOTE_RACE: &str = "Vote changed concurrently, please retry";

#[derive(Clone)]
pub struct VoteService {
    repos: Repositories,
}

impl VoteService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Owner and status of the voted entity, or not-found.
    async fn snapshot(&self, target: VoteTarget) -> Result<ContentSnapshot, DomainError> {
        let found = match target {
            VoteTarget::Post(id) => self
                .repos
                .posts
                .find_by_id(id)
                .await?
                .map(|p| ContentSnapshot::new(p.user_id, p.status)),
            VoteTarget::Comment(id) => self
                .repos
                .comments
                .find_by_id(id)
                .await?
                .map(|c| ContentSnapshot::new(c.user_id, c.status)),
        };
        found.ok_or_else(|| DomainError::not_found(target.entity()))
    }

    /// Submit a vote. A repeat of the current kind removes it, the opposite
    /// kind flips it.
    pub async fn vote_on(
        &self,
        viewer: &Viewer,
        target: VoteTarget,
        kind: VoteKind,
    ) -> Result<VoteAction, DomainError> {
        let member = viewer.require_member()?;
        let snapshot = self.snapshot(target).await?;
        policy::vote(viewer, target, snapshot).into_result()?;

        let votes = &self.repos.votes;
        let existing = votes.find(target, member.id).await?;
        let action = reconcile(existing.as_ref().map(|v| v.kind), kind);
        let lost_race = || {
            debug!(?target, user_id = member.id, "Concurrent vote lost the race");
            DomainError::conflict(VOTE_RACE)
        };
        match action {
            VoteAction::Created => {
                votes
                    .insert(target, member.id, kind)
                    .await
                    .map_err(|e| match e {
                        RepoError::Constraint(_) => lost_race(),
                        RepoError::Reference(_) => DomainError::not_found(target.entity()),
                        other => other.into(),
                    })?;
            }
            VoteAction::Updated => {
                votes
                    .set_kind(target, member.id, kind)
                    .await
                    .map_err(|e| match e {
                        RepoError::NotFound => lost_race(),
                        other => other.into(),
                    })?;
            }
            VoteAction::Removed => {
                votes.remove(target, member.id).await?;
            }
        }
        info!(?target, user_id = member.id, kind = %kind, ?action, "Vote reconciled");
        Ok(action)
    }

    /// Remove the viewer's vote, whatever its kind.
    pub async fn unvote(&self, viewer: &Viewer, target: VoteTarget) -> Result<(), DomainError> {
        let member = viewer.require_member()?;
        if !self.repos.votes.remove(target, member.id).await? {
            return Err(DomainError::NotFound("Like not found".to_string()));
        }
        info!(?target, user_id = member.id, "Vote removed");
        Ok(())
    }

    pub async fn list(&self, viewer: &Viewer, target: VoteTarget) -> Result<Vec<VoteRow>, DomainError> {
        let snapshot = self.snapshot(target).await?;
        policy::list_votes(viewer, target, snapshot).into_result()?;
        Ok(self.repos.votes.list(target).await?)
    }
}
