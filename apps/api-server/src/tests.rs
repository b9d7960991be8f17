//! End-to-end HTTP tests against the real router, server-side sessions and
//! the in-memory store.

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};

use usof_core::services::{Credentials, Links, Services};
use usof_infra::{Argon2PasswordService, HexTokenGenerator, InMemoryStore, OutboxMailer};

use crate::app::{SESSION_COOKIE, build_app};
use crate::config::SessionConfig;
use crate::state::AppState;

const PASSWORD: &str = "pw1234";

pub(crate) fn test_state() -> (AppState, Arc<OutboxMailer>) {
    let store = Arc::new(InMemoryStore::new());
    let outbox = Arc::new(OutboxMailer::new());
    let credentials = Credentials {
        passwords: Arc::new(Argon2PasswordService::new()),
        tokens: Arc::new(HexTokenGenerator),
        mailer: outbox.clone(),
        links: Links::new("http://forum.test"),
    };
    let uploads = std::env::temp_dir().join(format!("usof-test-{}", uuid::Uuid::new_v4()));
    let state = AppState::with_services(Services::new(store.repositories(), credentials), uploads);
    (state, outbox)
}

fn test_session_config() -> SessionConfig {
    SessionConfig {
        key: Key::generate(),
        cookie_secure: false,
        ttl_hours: 1,
    }
}

struct Reply {
    status: StatusCode,
    body: Value,
    cookie: Option<Cookie<'static>>,
}

async fn call<S, B>(app: &S, req: Request) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req).await;
    let status = res.status();
    let cookie = res
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned());
    let bytes = test::read_body(res).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        body,
        cookie,
    }
}

fn get(uri: &str, cookie: Option<&Cookie<'static>>) -> test::TestRequest {
    with_cookie(test::TestRequest::get().uri(uri), cookie)
}

fn post(uri: &str, cookie: Option<&Cookie<'static>>, body: Value) -> test::TestRequest {
    with_cookie(test::TestRequest::post().uri(uri).set_json(body), cookie)
}

fn patch(uri: &str, cookie: Option<&Cookie<'static>>, body: Value) -> test::TestRequest {
    with_cookie(test::TestRequest::patch().uri(uri).set_json(body), cookie)
}

fn with_cookie(req: test::TestRequest, cookie: Option<&Cookie<'static>>) -> test::TestRequest {
    match cookie {
        Some(c) => req.cookie(c.clone()),
        None => req,
    }
}

/// Hex token following `marker` in the last mail sent to `email`.
fn mailed_token(outbox: &OutboxMailer, email: &str, marker: &str) -> String {
    let mail = outbox.last_to(email).expect("mail sent");
    let start = mail.html.find(marker).expect("link in mail") + marker.len();
    mail.html[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect()
}

fn login_request(body: Value) -> Request {
    post("/api/auth/login", None, body).to_request()
}

async fn login<S, B>(app: &S, login: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = call(app, login_request(json!({ "login": login, "password": PASSWORD }))).await;
    assert_eq!(res.status, StatusCode::OK, "login {login}: {}", res.body);
    res.cookie.expect("session cookie set on login")
}

fn register_request(login: &str, email: &str) -> Request {
    post(
        "/api/auth/register",
        None,
        json!({
            "login": login,
            "email": email,
            "password": PASSWORD,
            "confirmPassword": PASSWORD,
        }),
    )
    .to_request()
}

/// Register, confirm through the mailed link and log in.
async fn member<S, B>(app: &S, outbox: &OutboxMailer, name: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let email = format!("{name}@x");
    let res = call(app, register_request(name, &email)).await;
    assert_eq!(res.status, StatusCode::CREATED, "register: {}", res.body);

    let token = mailed_token(outbox, &email, "/confirm-email/");
    let res = call(app, get(&format!("/api/auth/confirm-email/{token}"), None).to_request()).await;
    assert_eq!(res.status, StatusCode::OK);
    login(app, name).await
}

async fn admin<S, B>(app: &S, state: &AppState, name: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    state
        .services
        .users
        .bootstrap_admin(name, &format!("{name}@x"), PASSWORD)
        .await
        .unwrap();
    login(app, name).await
}

async fn category<S, B>(app: &S, admin: &Cookie<'static>, title: &str) -> i64
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = call(
        app,
        post("/api/categories", Some(admin), json!({ "title": title })).to_request(),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "category: {}", res.body);
    res.body["data"]["id"].as_i64().unwrap()
}

#[actix_web::test]
async fn test_register_confirm_login_me() {
    let (state, outbox) = test_state();
    let app = test::init_service(build_app(state, &test_session_config())).await;

    let alice = member(&app, &outbox, "alice").await;

    let me = call(&app, get("/api/auth/me", Some(&alice)).to_request()).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["login"], "alice");
    assert_eq!(me.body["data"]["role"], "user");
    assert!(me.body["data"].get("password_hash").is_none());

    let out = call(&app, post("/api/auth/logout", Some(&alice), json!({})).to_request()).await;
    assert_eq!(out.status, StatusCode::OK);
    let cleared = out.cookie.expect("logout clears the cookie");

    let me = call(&app, get("/api/auth/me", Some(&cleared)).to_request()).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    let again = call(&app, post("/api/auth/logout", Some(&cleared), json!({})).to_request()).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["detail"], "Not logged in");
}

#[actix_web::test]
async fn test_logout_revokes_every_copy_of_the_session() {
    let (state, outbox) = test_state();
    let app = test::init_service(build_app(state, &test_session_config())).await;

    let alice = member(&app, &outbox, "alice").await;
    let stolen = alice.clone();

    let out = call(&app, post("/api/auth/logout", Some(&alice), json!({})).to_request()).await;
    assert_eq!(out.status, StatusCode::OK);

    let me = call(&app, get("/api/auth/me", Some(&stolen)).to_request()).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    // A new login issues a different key; the revoked one stays dead.
    let fresh = login(&app, "alice").await;
    assert_ne!(fresh.value(), stolen.value());
    let me = call(&app, get("/api/auth/me", Some(&stolen)).to_request()).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    let me = call(&app, get("/api/auth/me", Some(&fresh)).to_request()).await;
    assert_eq!(me.status, StatusCode::OK);
}

#[actix_web::test]
async fn test_confirmation_link_works_once() {
    let (state, outbox) = test_state();
    let app = test::init_service(build_app(state, &test_session_config())).await;

    let res = call(&app, register_request("dave", "dave@x")).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let token = mailed_token(&outbox, "dave@x", "/confirm-email/");
    let link = format!("/api/auth/confirm-email/{token}");

    let first = call(&app, get(&link, None).to_request()).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["message"], "Email confirmed successfully");

    let second = call(&app, get(&link, None).to_request()).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.body["detail"], "Invalid or expired confirmation token");
}

#[actix_web::test]
async fn test_login_requires_confirmed_email() {
    let (state, _outbox) = test_state();
    let app = test::init_service(build_app(state, &test_session_config())).await;

    let res = call(&app, register_request("dave", "dave@x")).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert!(res.body["data"]["userId"].is_number());

    let res = call(&app, login_request(json!({ "login": "dave", "password": PASSWORD }))).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.cookie.is_none());

    let dup = call(&app, register_request("dave", "other@x")).await;
    assert_eq!(dup.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_password_reset_does_not_reveal_accounts() {
    let (state, outbox) = test_state();
    let app = test::init_service(build_app(state, &test_session_config())).await;
    let _alice = member(&app, &outbox, "alice").await;

    let known = call(
        &app,
        post("/api/auth/password-reset", None, json!({ "email": "alice@x" })).to_request(),
    )
    .await;
    let unknown = call(
        &app,
        post("/api/auth/password-reset", None, json!({ "email": "nobody@x" })).to_request(),
    )
    .await;
    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(known.body, unknown.body);

    let token = mailed_token(&outbox, "alice@x", "/password-reset/");

    let res = call(
        &app,
        post(
            &format!("/api/auth/password-reset/{token}"),
            None,
            json!({ "password": "newpass1", "confirmPassword": "newpass1" }),
        )
        .to_request(),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = call(&app, login_request(json!({ "login": "alice", "password": "newpass1" }))).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn test_post_votes_lock_and_visibility() {
    let (state, outbox) = test_state();
    let app = test::init_service(build_app(state.clone(), &test_session_config())).await;

    let alice = member(&app, &outbox, "alice").await;
    let bob = member(&app, &outbox, "bob").await;
    let carol = admin(&app, &state, "carol").await;
    let c1 = category(&app, &carol, "rust").await;
    let _c2 = category(&app, &carol, "go").await;
    let c3 = category(&app, &carol, "zig").await;

    // Create and read back.
    let res = call(
        &app,
        post(
            "/api/posts",
            Some(&alice),
            json!({ "title": "Q1", "content": "body", "categories": [c1, c3] }),
        )
        .to_request(),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let id = res.body["data"]["id"].as_i64().unwrap();
    let post_uri = format!("/api/posts/{id}");
    let like_uri = format!("{post_uri}/like");

    let detail = call(&app, get(&post_uri, None).to_request()).await;
    assert_eq!(detail.status, StatusCode::OK);
    let data = &detail.body["data"];
    assert_eq!(data["title"], "Q1");
    assert_eq!(data["status"], "active");
    assert_eq!(data["likes_count"], 0);
    assert_eq!(data["comments_count"], 0);
    let cats: Vec<i64> = data["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert!(cats.contains(&c1) && cats.contains(&c3));

    // Like toggles, dislike replaces.
    let res = call(&app, post(&like_uri, Some(&bob), json!({})).to_request()).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["action"], "created");
    let detail = call(&app, get(&post_uri, None).to_request()).await;
    assert_eq!(detail.body["data"]["likes_count"], 1);

    let res = call(&app, post(&like_uri, Some(&bob), json!({ "type": "like" })).to_request()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["action"], "removed");
    let detail = call(&app, get(&post_uri, None).to_request()).await;
    assert_eq!(detail.body["data"]["likes_count"], 0);

    let res = call(&app, post(&like_uri, Some(&bob), json!({ "type": "dislike" })).to_request()).await;
    assert_eq!(res.body["data"]["action"], "created");
    let detail = call(&app, get(&post_uri, None).to_request()).await;
    let net = detail.body["data"]["likes_count"].as_i64().unwrap()
        - detail.body["data"]["dislikes_count"].as_i64().unwrap();
    assert_eq!(net, -1);

    let res = call(&app, post(&like_uri, Some(&bob), json!({ "type": "meh" })).to_request()).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = call(&app, post(&like_uri, None, json!({})).to_request()).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    // Locked posts refuse votes and comments.
    let res = call(&app, patch(&post_uri, Some(&alice), json!({ "status": "locked" })).to_request()).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let res = call(&app, post(&like_uri, Some(&bob), json!({ "type": "like" })).to_request()).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(res.body["detail"].as_str().unwrap().contains("locked"));

    let comments_uri = format!("{post_uri}/comments");
    let res = call(&app, post(&comments_uri, Some(&bob), json!({ "content": "hi" })).to_request()).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(res.body["detail"].as_str().unwrap().contains("locked"));

    let res = call(&app, patch(&post_uri, Some(&alice), json!({ "status": "active" })).to_request()).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = call(&app, post(&comments_uri, Some(&bob), json!({ "content": "hi" })).to_request()).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let listed = call(&app, get(&comments_uri, None).to_request()).await;
    assert_eq!(listed.body["data"]["comments"].as_array().unwrap().len(), 1);

    // Inactive posts vanish for everyone but the owner and admins.
    let res = call(&app, patch(&post_uri, Some(&alice), json!({ "status": "inactive" })).to_request()).await;
    assert_eq!(res.status, StatusCode::OK);

    let anon = call(&app, get(&post_uri, None).to_request()).await;
    assert_eq!(anon.status, StatusCode::NOT_FOUND);
    let other = call(&app, get(&post_uri, Some(&bob)).to_request()).await;
    assert_eq!(other.status, StatusCode::NOT_FOUND);
    let likes = call(&app, get(&like_uri, Some(&bob)).to_request()).await;
    assert_eq!(likes.status, StatusCode::NOT_FOUND);

    let owner = call(&app, get(&post_uri, Some(&alice)).to_request()).await;
    assert_eq!(owner.status, StatusCode::OK);
    assert_eq!(owner.body["data"]["status"], "inactive");

    let ids = |body: &Value| -> Vec<i64> {
        body["data"]["posts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_i64().unwrap())
            .collect()
    };
    let public = call(&app, get("/api/posts", None).to_request()).await;
    assert!(!ids(&public.body).contains(&id));
    let admin_view = call(&app, get("/api/posts?status=admin_view", Some(&carol)).to_request()).await;
    assert_eq!(admin_view.status, StatusCode::OK);
    assert!(ids(&admin_view.body).contains(&id));
    let sneaky = call(&app, get("/api/posts?status=admin_view", Some(&bob)).to_request()).await;
    assert!(!ids(&sneaky.body).contains(&id));
}

#[actix_web::test]
async fn test_listing_filters_and_pagination() {
    let (state, outbox) = test_state();
    let app = test::init_service(build_app(state.clone(), &test_session_config())).await;

    let alice = member(&app, &outbox, "alice").await;
    let carol = admin(&app, &state, "carol").await;
    let rust = category(&app, &carol, "rust").await;
    let go = category(&app, &carol, "go").await;

    for (title, cat) in [("a", rust), ("b", go), ("c", rust)] {
        let res = call(
            &app,
            post(
                "/api/posts",
                Some(&alice),
                json!({ "title": title, "content": "x", "categories": [cat] }),
            )
            .to_request(),
        )
        .await;
        assert_eq!(res.status, StatusCode::CREATED);
    }

    let res = call(
        &app,
        get(&format!("/api/posts?categories={rust}&sortBy=date&order=asc&limit=1&page=2"), None)
            .to_request(),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["pagination"]["totalItems"], 2);
    assert_eq!(res.body["data"]["pagination"]["totalPages"], 2);
    assert_eq!(res.body["data"]["posts"][0]["title"], "c");

    let res = call(&app, get(&format!("/api/categories/{go}/posts"), None).to_request()).await;
    assert_eq!(res.body["data"]["posts"].as_array().unwrap().len(), 1);

    let res = call(&app, get("/api/posts?categories=abc", None).to_request()).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = call(
        &app,
        post(
            "/api/posts",
            Some(&alice),
            json!({ "title": "d", "content": "x", "categories": [999] }),
        )
        .to_request(),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let stats = call(&app, get("/api/stats", None).to_request()).await;
    assert_eq!(stats.body["data"]["totalPosts"], 3);
    assert_eq!(stats.body["data"]["totalCategories"], 2);

    let count = call(&app, get("/api/users/count", None).to_request()).await;
    assert_eq!(count.body["data"]["totalUsers"], 2);
}

#[actix_web::test]
async fn test_concurrent_favorites_never_fail_with_500() {
    let (state, outbox) = test_state();
    let app = test::init_service(build_app(state, &test_session_config())).await;

    let alice = member(&app, &outbox, "alice").await;
    let bob = member(&app, &outbox, "bob").await;
    let res = call(
        &app,
        post("/api/posts", Some(&alice), json!({ "title": "P", "content": "x", "categories": [] }))
            .to_request(),
    )
    .await;
    let id = res.body["data"]["id"].as_i64().unwrap();
    let fav_uri = format!("/api/favorites/{id}");

    let (first, second) = futures::join!(
        call(&app, post(&fav_uri, Some(&bob), json!({})).to_request()),
        call(&app, post(&fav_uri, Some(&bob), json!({})).to_request()),
    );
    let mut statuses = [first.status, second.status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);
    let rejected = if first.status == StatusCode::BAD_REQUEST { first } else { second };
    assert_eq!(rejected.body["detail"], "Post already in favorites");

    let status_uri = format!("/api/posts/{id}/favorite-status");
    let anon = call(&app, get(&status_uri, None).to_request()).await;
    assert_eq!(anon.body["data"]["isFavorited"], false);
    let mine = call(&app, get(&status_uri, Some(&bob)).to_request()).await;
    assert_eq!(mine.body["data"]["isFavorited"], true);

    let list = call(&app, get("/api/favorites", Some(&bob)).to_request()).await;
    assert_eq!(list.body["data"]["favorites"][0]["id"], id);

    let res = call(
        &app,
        test::TestRequest::delete()
            .uri(&fav_uri)
            .cookie(bob.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    let mine = call(&app, get(&status_uri, Some(&bob)).to_request()).await;
    assert_eq!(mine.body["data"]["isFavorited"], false);
}

#[actix_web::test]
async fn test_deleted_user_session_becomes_anonymous() {
    let (state, outbox) = test_state();
    let app = test::init_service(build_app(state.clone(), &test_session_config())).await;

    let bob = member(&app, &outbox, "bob").await;
    let carol = admin(&app, &state, "carol").await;
    let me = call(&app, get("/api/auth/me", Some(&bob)).to_request()).await;
    let bob_id = me.body["data"]["id"].as_i64().unwrap();

    let users = call(&app, get("/api/users", Some(&bob)).to_request()).await;
    assert_eq!(users.status, StatusCode::FORBIDDEN);

    let res = call(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/users/{bob_id}"))
            .cookie(carol.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    let me = call(&app, get("/api/auth/me", Some(&bob)).to_request()).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    let missing = call(&app, get("/api/users/not-a-number", None).to_request()).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_profile_picture_upload() {
    let (state, outbox) = test_state();
    let uploads = state.uploads_dir.clone();
    let app = test::init_service(build_app(state, &test_session_config())).await;
    let alice = member(&app, &outbox, "alice").await;

    let upload = |content_type: &'static str, cookie: Option<&Cookie<'static>>| {
        with_cookie(
            test::TestRequest::patch()
                .uri("/api/users/pfp")
                .insert_header(("content-type", content_type))
                .set_payload(vec![0x89, b'P', b'N', b'G']),
            cookie,
        )
        .to_request()
    };

    let res = call(&app, upload("image/png", None)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = call(&app, upload("text/plain", Some(&alice))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = call(&app, upload("image/png", Some(&alice))).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let first = res.body["data"]["profile_picture"].as_str().unwrap().to_string();
    assert!(first.starts_with("pfp-") && first.ends_with(".png"));
    assert!(uploads.join(&first).exists());

    let res = call(&app, upload("image/gif", Some(&alice))).await;
    let second = res.body["data"]["profile_picture"].as_str().unwrap().to_string();
    assert!(uploads.join(&second).exists());
    assert!(!uploads.join(&first).exists());

    let me = call(&app, get("/api/auth/me", Some(&alice)).to_request()).await;
    assert_eq!(me.body["data"]["profile_picture"], second.as_str());

    let _ = std::fs::remove_dir_all(&uploads);
}

const BOUNDARY: &str = "usof-boundary";

fn multipart_body(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"me.img\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

#[actix_web::test]
async fn test_profile_picture_multipart_upload() {
    let (state, outbox) = test_state();
    let uploads = state.uploads_dir.clone();
    let app = test::init_service(build_app(state, &test_session_config())).await;
    let alice = member(&app, &outbox, "alice").await;

    let upload = |body: Vec<u8>| {
        with_cookie(
            test::TestRequest::patch()
                .uri("/api/users/pfp")
                .insert_header((
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                ))
                .set_payload(body),
            Some(&alice),
        )
        .to_request()
    };

    let res = call(&app, upload(multipart_body("avatar", "image/png", b"\x89PNG"))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["detail"], "No file uploaded");

    let res = call(
        &app,
        upload(multipart_body("profile_picture", "text/plain", b"hello")),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["detail"], "Only JPEG, PNG and GIF images are allowed");

    let oversized = vec![0u8; 5 * 1024 * 1024 + 1];
    let res = call(&app, upload(multipart_body("profile_picture", "image/png", &oversized))).await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);

    let res = call(
        &app,
        upload(multipart_body("profile_picture", "image/png", b"\x89PNG")),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let stored = res.body["data"]["profile_picture"].as_str().unwrap().to_string();
    assert!(stored.starts_with("pfp-") && stored.ends_with(".png"));
    assert_eq!(std::fs::read(uploads.join(&stored)).unwrap(), b"\x89PNG");

    let _ = std::fs::remove_dir_all(&uploads);
}
