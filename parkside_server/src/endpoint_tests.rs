use actix_web::{http::StatusCode, test, web, App};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use parkside_engine::{
    db_types::{NewUser, Role, UserStatus},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    AccountApi,
    AccountManagement,
    AuthApi,
    SqliteDatabase,
};
use serde_json::Value;

use crate::{
    auth::{LoginToken, TokenIssuer},
    config::ServerConfig,
    routes::{admin_users, auth, health, my_profile},
};

async fn test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn register(db: &SqliteDatabase, name: &str) -> i64 {
    db.register_user(NewUser {
        username: name.to_string(),
        email: format!("{name}@example.com"),
        phone: format!("+7-000-{name}"),
        password_hash: "$fake$hash".to_string(),
    })
    .await
    .unwrap()
}

fn login_token(email: &str, desired_role: Option<Role>, config: &ServerConfig) -> String {
    let claims = LoginToken {
        sub: email.to_string(),
        desired_role,
        exp: (Utc::now() + Duration::minutes(5)).timestamp(),
    };
    let key = EncodingKey::from_secret(config.auth.login_secret.reveal().as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

macro_rules! test_app {
    ($db:expr, $config:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AuthApi::new($db.clone())))
                .app_data(web::Data::new(AccountApi::new($db.clone())))
                .app_data(web::Data::new(TokenIssuer::new(&$config.auth)))
                .app_data(web::Data::new($config.clone()))
                .service(health)
                .service(web::resource("/auth").route(web::post().to(auth::<SqliteDatabase>)))
                .service(web::resource("/api/me").route(web::get().to(my_profile::<SqliteDatabase>)))
                .service(web::resource("/api/admin/users").route(web::get().to(admin_users::<SqliteDatabase>))),
        )
        .await
    };
}

#[actix_web::test]
async fn health_check() {
    let db = test_db().await;
    let config = ServerConfig::default();
    let app = test_app!(db, config);
    let req = test::TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
}

#[actix_web::test]
async fn auth_flow_issues_a_usable_access_token() {
    let db = test_db().await;
    let config = ServerConfig::default();
    register(&db, "alice").await;
    let app = test_app!(db, config);

    let req = test::TestRequest::post()
        .uri("/auth")
        .insert_header(("pks_login_token", login_token("alice@example.com", None, &config)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let access_token = body["access_token"].as_str().expect("No access token in response").to_string();

    let req = test::TestRequest::get()
        .uri("/api/me")
        .insert_header(("Authorization", format!("Bearer {access_token}")))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["username"], "alice");
}

#[actix_web::test]
async fn auth_rejects_unknown_accounts() {
    let db = test_db().await;
    let config = ServerConfig::default();
    let app = test_app!(db, config);
    let req = test::TestRequest::post()
        .uri("/auth")
        .insert_header(("pks_login_token", login_token("stranger@example.com", None, &config)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn auth_rejects_blacklisted_accounts() {
    let db = test_db().await;
    let config = ServerConfig::default();
    let user_id = register(&db, "mallory").await;
    db.update_user_status(user_id, UserStatus::Black).await.unwrap();
    let app = test_app!(db, config);
    let req = test::TestRequest::post()
        .uri("/auth")
        .insert_header(("pks_login_token", login_token("mallory@example.com", None, &config)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn protected_routes_require_a_token() {
    let db = test_db().await;
    let config = ServerConfig::default();
    let app = test_app!(db, config);
    let req = test::TestRequest::get().uri("/api/me").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_routes_refuse_plain_users() {
    let db = test_db().await;
    let config = ServerConfig::default();
    register(&db, "bob").await;
    let app = test_app!(db, config);
    let req = test::TestRequest::post()
        .uri("/auth")
        .insert_header(("pks_login_token", login_token("bob@example.com", None, &config)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/admin/users")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admins_reach_admin_routes() {
    let db = test_db().await;
    let config = ServerConfig::default();
    let user_id = register(&db, "root").await;
    db.assign_role(user_id, Role::Admin).await.unwrap();
    let app = test_app!(db, config);
    let req = test::TestRequest::post()
        .uri("/auth")
        .insert_header(("pks_login_token", login_token("root@example.com", Some(Role::Admin), &config)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/admin/users")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let users: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}
