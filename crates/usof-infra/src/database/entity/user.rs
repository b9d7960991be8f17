//! User entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use super::enums::DbRole;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub login: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: DbRole,
    pub email_confirmed: bool,
    pub email_token: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<DateTimeWithTimeZone>,
    pub profile_picture: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain User.
impl From<Model> for usof_core::domain::User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            login: model.login,
            email: model.email,
            password_hash: model.password_hash,
            full_name: model.full_name,
            role: model.role.into(),
            email_confirmed: model.email_confirmed,
            email_token: model.email_token,
            reset_token: model.reset_token,
            reset_token_expires: model.reset_token_expires.map(Into::into),
            profile_picture: model.profile_picture,
            created_at: model.created_at.into(),
        }
    }
}

/// Every column of an existing account, ready for an UPDATE.
impl From<&usof_core::domain::User> for ActiveModel {
    fn from(user: &usof_core::domain::User) -> Self {
        Self {
            id: Set(user.id),
            login: Set(user.login.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            full_name: Set(user.full_name.clone()),
            role: Set(user.role.into()),
            email_confirmed: Set(user.email_confirmed),
            email_token: Set(user.email_token.clone()),
            reset_token: Set(user.reset_token.clone()),
            reset_token_expires: Set(user.reset_token_expires.map(Into::into)),
            profile_picture: Set(user.profile_picture.clone()),
            created_at: Set(user.created_at.into()),
        }
    }
}

/// A fresh account; the database assigns the id.
impl From<usof_core::domain::NewUser> for ActiveModel {
    fn from(user: usof_core::domain::NewUser) -> Self {
        Self {
            login: Set(user.login),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            full_name: Set(user.full_name),
            role: Set(user.role.into()),
            email_confirmed: Set(user.email_confirmed),
            email_token: Set(user.email_token),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
    }
}
