//! HTTP handlers and route configuration.

mod auth;
mod categories;
mod comments;
mod favorites;
mod health;
mod posts;
mod users;
mod votes;

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};

use usof_core::domain::User;
use usof_core::query::{PageRequest, PostListParams};
use usof_shared::dto::UserResponse;

use crate::middleware::error::AppError;

/// Configure all application routes.
///
/// Literal segments (`/users/count`, `/users/pfp`) are registered before the
/// `{id}` routes they would otherwise collide with.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .route("/stats", web::get().to(health::stats))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/confirm-email/{token}", web::get().to(auth::confirm_email))
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/password-reset", web::post().to(auth::request_password_reset))
                    .route(
                        "/password-reset/{token}",
                        web::post().to(auth::confirm_password_reset),
                    )
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/users")
                    .route("", web::get().to(users::list))
                    .route("", web::post().to(users::create))
                    .route("/count", web::get().to(users::count))
                    .service(
                        web::resource("/pfp").route(web::patch().to(users::upload_picture)),
                    )
                    .route("/{id}", web::get().to(users::profile))
                    .route("/{id}", web::patch().to(users::update))
                    .route("/{id}", web::delete().to(users::delete)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    .route("/{id}", web::get().to(posts::detail))
                    .route("/{id}", web::patch().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete))
                    .route("/{id}/comments", web::get().to(posts::comments))
                    .route("/{id}/comments", web::post().to(posts::add_comment))
                    .route("/{id}/categories", web::get().to(posts::categories))
                    .route("/{id}/like", web::get().to(posts::likes))
                    .route("/{id}/like", web::post().to(posts::vote))
                    .route("/{id}/like", web::delete().to(posts::unvote))
                    .route("/{id}/favorite-status", web::get().to(posts::favorite_status)),
            )
            .service(
                web::scope("/categories")
                    .route("", web::get().to(categories::list))
                    .route("", web::post().to(categories::create))
                    .route("/{id}", web::get().to(categories::detail))
                    .route("/{id}", web::patch().to(categories::update))
                    .route("/{id}", web::delete().to(categories::delete))
                    .route("/{id}/posts", web::get().to(categories::posts)),
            )
            .service(
                web::scope("/comments")
                    .route("", web::get().to(comments::list_all))
                    .route("/{id}", web::get().to(comments::detail))
                    .route("/{id}", web::patch().to(comments::update))
                    .route("/{id}", web::delete().to(comments::delete))
                    .route("/{id}/like", web::get().to(comments::likes))
                    .route("/{id}/like", web::post().to(comments::vote))
                    .route("/{id}/like", web::delete().to(comments::unvote)),
            )
            .service(
                web::scope("/favorites")
                    .route("", web::get().to(favorites::list))
                    .route("/{post_id}", web::post().to(favorites::add))
                    .route("/{post_id}", web::delete().to(favorites::remove)),
            ),
    );
}

/// Raw query pairs, kept in order so `categories` may repeat.
#[derive(Debug, Default)]
pub struct ListQuery(Vec<(String, String)>);

impl ListQuery {
    fn get(&self, key: &str) -> Option<String> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn page(&self) -> PageRequest {
        PageRequest::parse(self.get("page").as_deref(), self.get("limit").as_deref())
    }

    pub fn post_params(&self) -> PostListParams {
        PostListParams {
            page: self.get("page"),
            limit: self.get("limit"),
            sort_by: self.get("sortBy"),
            order: self.get("order"),
            categories: self
                .0
                .iter()
                .filter(|(k, _)| k == "categories" || k == "categories[]")
                .map(|(_, v)| v.clone())
                .collect(),
            date_from: self.get("dateFrom"),
            date_to: self.get("dateTo"),
            status: self.get("status"),
        }
    }
}

impl FromRequest for ListQuery {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            web::Query::<Vec<(String, String)>>::from_query(req.query_string())
                .map(|q| ListQuery(q.into_inner()))
                .map_err(|e| AppError::BadRequest(format!("Invalid query string: {e}"))),
        )
    }
}

/// Account view of a user. Never carries the hash or tokens.
pub(crate) fn user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        login: user.login,
        email: user.email,
        full_name: user.full_name,
        role: user.role.as_str().to_string(),
        profile_picture: user.profile_picture,
        email_confirmed: user.email_confirmed,
        created_at: user.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        ListQuery(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_post_params_collect_repeated_categories() {
        let q = query(&[
            ("categories", "1,3"),
            ("categories", "4"),
            ("sortBy", "date"),
            ("status", "admin_view"),
        ]);
        let params = q.post_params();
        assert_eq!(params.categories, vec!["1,3", "4"]);
        assert_eq!(params.sort_by.as_deref(), Some("date"));
        assert!(params.wants_admin_view());
    }

    #[test]
    fn test_page_coerces_garbage() {
        let page = query(&[("page", "0"), ("limit", "abc")]).page();
        assert_eq!(page, PageRequest::default());
    }
}
