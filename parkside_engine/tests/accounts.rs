mod support;

use parkside_engine::{
    db_types::{NewUser, NewVehicle, Role, UserStatus},
    AccountApi,
    AccountApiError,
    AuthApi,
    AuthApiError,
};
use support::{new_test_db, register_user, seed_single_spot_lot};

fn new_user(name: &str, email: &str, phone: &str) -> NewUser {
    NewUser {
        username: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        password_hash: "$fake$hash".to_string(),
    }
}

#[tokio::test]
async fn registration_reports_which_field_clashed() {
    let db = new_test_db().await;
    let api = AccountApi::new(db);
    api.register_user(new_user("dora", "dora@example.com", "+7-1")).await.unwrap();

    let err = api.register_user(new_user("dora", "other@example.com", "+7-2")).await.unwrap_err();
    assert!(matches!(err, AccountApiError::UsernameTaken));
    let err = api.register_user(new_user("dora2", "dora@example.com", "+7-2")).await.unwrap_err();
    assert!(matches!(err, AccountApiError::EmailTaken));
    let err = api.register_user(new_user("dora2", "other@example.com", "+7-1")).await.unwrap_err();
    assert!(matches!(err, AccountApiError::PhoneTaken));
}

#[tokio::test]
async fn fresh_accounts_get_the_user_role() {
    let db = new_test_db().await;
    let user_id = register_user(&db, "erik").await;
    let api = AuthApi::new(db);
    let identity = api.authenticate("erik@example.com", Role::User).await.unwrap();
    assert_eq!(identity.user_id, user_id);
    assert_eq!(identity.role, Role::User);
    assert_eq!(identity.status, UserStatus::White);
}

#[tokio::test]
async fn role_escalation_is_refused() {
    let db = new_test_db().await;
    register_user(&db, "erik").await;
    let api = AuthApi::new(db);
    let err = api.authenticate("erik@example.com", Role::Admin).await.unwrap_err();
    assert!(matches!(err, AuthApiError::RoleNotAllowed(_)));
}

#[tokio::test]
async fn admins_can_request_the_admin_role() {
    let db = new_test_db().await;
    let user_id = register_user(&db, "frida").await;
    db.assign_role(user_id, Role::Admin).await.unwrap();
    let api = AuthApi::new(db);
    let identity = api.authenticate("frida@example.com", Role::Admin).await.unwrap();
    assert!(identity.role.may_administer());
}

#[tokio::test]
async fn blacklisted_accounts_cannot_authenticate() {
    let db = new_test_db().await;
    let user_id = register_user(&db, "grace").await;
    let accounts = AccountApi::new(db.clone());
    accounts.update_user_status(user_id, UserStatus::Black).await.unwrap();
    let api = AuthApi::new(db);
    let err = api.authenticate("grace@example.com", Role::User).await.unwrap_err();
    assert!(matches!(err, AuthApiError::Blacklisted));
}

#[tokio::test]
async fn unknown_email_is_not_found() {
    let db = new_test_db().await;
    let api = AuthApi::new(db);
    let err = api.authenticate("nobody@example.com", Role::User).await.unwrap_err();
    assert!(matches!(err, AuthApiError::AccountNotFound));
}

#[tokio::test]
async fn profile_includes_bookings_and_vehicles() {
    let lot = seed_single_spot_lot("1 Profile St", 100_00).await;
    sqlx::query(
        "INSERT INTO bookings (user_id, spot_id, start_time, end_time) VALUES ($1, $2, '2030-01-01 08:00:00', '2030-01-01 10:00:00')",
    )
    .bind(lot.user_id)
    .bind(lot.spot_id)
    .execute(lot.db.pool())
    .await
    .unwrap();
    let booking_id: i64 = sqlx::query_scalar("SELECT id FROM bookings").fetch_one(lot.db.pool()).await.unwrap();

    let api = AccountApi::new(lot.db.clone());
    api.add_vehicle(NewVehicle {
        user_id: lot.user_id,
        plate: "X001YZ".to_string(),
        brand: "Volga".to_string(),
        booking_id: Some(booking_id),
    })
    .await
    .unwrap();

    let profile = api.user_profile(lot.user_id).await.unwrap();
    assert_eq!(profile.username, "alice");
    assert_eq!(profile.bookings.len(), 1);
    assert_eq!(profile.bookings[0].address, "1 Profile St");
    assert_eq!(profile.bookings[0].vehicle_plate.as_deref(), Some("X001YZ"));
}

#[tokio::test]
async fn vehicles_for_unknown_users_are_refused() {
    let db = new_test_db().await;
    let api = AccountApi::new(db);
    let err = api
        .add_vehicle(NewVehicle {
            user_id: 404,
            plate: "NOPE".to_string(),
            brand: "None".to_string(),
            booking_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AccountApiError::UserNotFound(404)));
}
