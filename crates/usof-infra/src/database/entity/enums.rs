//! Column enums stored as short strings.

use sea_orm::entity::prelude::*;

use usof_core::domain::{Role, VoteKind};
use usof_core::lifecycle::ContentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DbContentStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "locked")]
    Locked,
}

impl From<ContentStatus> for DbContentStatus {
    fn from(status: ContentStatus) -> Self {
        match status {
            ContentStatus::Active => Self::Active,
            ContentStatus::Inactive => Self::Inactive,
            ContentStatus::Locked => Self::Locked,
        }
    }
}

impl From<DbContentStatus> for ContentStatus {
    fn from(status: DbContentStatus) -> Self {
        match status {
            DbContentStatus::Active => Self::Active,
            DbContentStatus::Inactive => Self::Inactive,
            DbContentStatus::Locked => Self::Locked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DbRole {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl From<Role> for DbRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Admin => Self::Admin,
        }
    }
}

impl From<DbRole> for Role {
    fn from(role: DbRole) -> Self {
        match role {
            DbRole::User => Self::User,
            DbRole::Admin => Self::Admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DbVoteKind {
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "dislike")]
    Dislike,
}

impl From<VoteKind> for DbVoteKind {
    fn from(kind: VoteKind) -> Self {
        match kind {
            VoteKind::Like => Self::Like,
            VoteKind::Dislike => Self::Dislike,
        }
    }
}

impl From<DbVoteKind> for VoteKind {
    fn from(kind: DbVoteKind) -> Self {
        match kind {
            DbVoteKind::Like => Self::Like,
            DbVoteKind::Dislike => Self::Dislike,
        }
    }
}
