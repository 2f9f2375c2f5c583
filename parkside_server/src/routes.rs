//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the backend traits they need, so the server wiring in [`crate::server`]
//! instantiates them against `SqliteDatabase` with an explicit turbofish. actix's attribute macros cannot
//! register generic handlers, so registration happens with `web::resource(..).route(..)` instead.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread
//! will stall that worker. Any long, non-cpu-bound operation (I/O, database calls, the bounded
//! payment-correlation wait) must be awaited, never blocked on.
use std::str::FromStr;

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use parkside_engine::{
    correlation::{LatestBookings, PaymentCorrelation},
    db_types::{NewBooking, NewUser, NewVehicle, Role, UserStatus},
    AccountApi,
    AccountManagement,
    Analytics,
    AnalyticsApi,
    AuthApi,
    AuthManagement,
    BookingFlowApi,
    PaymentLedger,
    PaymentsApi,
    ReservationDatabase,
};
use pks_common::Cents;
use serde_json::json;

use crate::{
    auth::{check_login_token, JwtClaims, TokenIssuer},
    config::ServerConfig,
    data_objects::{
        BookingRequest,
        CancellationNoticeResponse,
        DateRange,
        JsonResponse,
        PaymentNotification,
        PendingPaymentResponse,
        RegisterUserRequest,
        RegisterUserResponse,
        SpotPriceUpdate,
        SpotStatusUpdate,
        UserStatusUpdate,
        VehicleRequest,
    },
    errors::ServerError,
};

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
/// Route handler for the auth endpoint
///
/// This route is used to authenticate a user and issue an access token.
///
/// Clients must supply a login token in the `pks_login_token` header. The login token is a JWT minted by
/// the credential module and carries (see [`crate::auth::LoginToken`]):
/// * `sub` - the account email the credential module vouches for,
/// * `desired_role` - optionally, the role the bearer wants to act as (defaults to `User`),
/// * `exp` - the token expiry.
///
/// If the account exists, is not black-listed, and holds the desired role, the server answers with a
/// short-lived access token for the `Authorization: Bearer` header. The token will NOT refresh.
pub async fn auth<A>(
    req: HttpRequest,
    api: web::Data<AuthApi<A>>,
    signer: web::Data<TokenIssuer>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError>
where
    A: AuthManagement,
{
    trace!("💻️ Received auth request");
    let payload = req.headers().get("pks_login_token").ok_or(ServerError::CouldNotDeserializeAuthToken)?;
    let login_token = payload.to_str().map_err(|e| {
        debug!("💻️ Could not read login token. {e}");
        ServerError::CouldNotDeserializeAuthToken
    })?;
    let token = check_login_token(login_token, &config.auth)?;
    debug!("💻️ Login token was validated for {}", token.sub);
    let desired_role = token.desired_role.unwrap_or(Role::User);
    let identity = api.authenticate(&token.sub, desired_role).await?;
    let access_token = signer.issue_token(&identity)?;
    trace!("💻️ Issued access token for {}", identity.email);
    Ok(HttpResponse::Ok().json(json!({ "access_token": access_token, "user_id": identity.user_id })))
}

//----------------------------------------------   Users  ----------------------------------------------------
pub async fn register<B: AccountManagement>(
    api: web::Data<AccountApi<B>>,
    body: web::Json<RegisterUserRequest>,
) -> Result<HttpResponse, ServerError> {
    let form = body.into_inner();
    debug!("💻️ POST register for username {}", form.username);
    let user = NewUser {
        username: form.username,
        email: form.email,
        phone: form.phone,
        password_hash: form.password_hash,
    };
    let user_id = api.register_user(user).await?;
    Ok(HttpResponse::Ok().json(RegisterUserResponse { user_id }))
}

pub async fn my_profile<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET profile for user {}", claims.user_id);
    let profile = api.user_profile(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Consumes the user's cancellation notice, if one is queued. One modal per notice: a second call
/// returns an empty response.
pub async fn cancellation_notice<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let message = api.consume_cancellation_notice(claims.user_id).await?;
    let response = match message {
        Some(cancellation_message) => {
            CancellationNoticeResponse { show_cancellation_modal: true, cancellation_message }
        },
        None => CancellationNoticeResponse { show_cancellation_modal: false, cancellation_message: String::new() },
    };
    Ok(HttpResponse::Ok().json(response))
}

pub async fn add_vehicle<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
    latest: web::Data<LatestBookings>,
    body: web::Json<VehicleRequest>,
) -> Result<HttpResponse, ServerError> {
    let booking_id = latest
        .get(claims.user_id)
        .ok_or_else(|| ServerError::NoRecordFound("No booking is tracked for this user".to_string()))?;
    let form = body.into_inner();
    let vehicle =
        NewVehicle { user_id: claims.user_id, plate: form.plate, brand: form.brand, booking_id: Some(booking_id) };
    api.add_vehicle(vehicle).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::ok("Vehicle saved")))
}

//----------------------------------------------   Bookings  ----------------------------------------------------
pub async fn create_booking<B>(
    claims: JwtClaims,
    api: web::Data<BookingFlowApi<B>>,
    latest: web::Data<LatestBookings>,
    body: web::Json<BookingRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: ReservationDatabase + Analytics + AccountManagement,
{
    let form = body.into_inner();
    debug!("💻️ POST booking for user {} at {}", claims.user_id, form.address);
    let request = NewBooking {
        user_id: claims.user_id,
        address: form.address,
        floor: form.floor,
        spot_number: form.spot_number,
        start_time: form.start_time,
        end_time: form.end_time,
    };
    let receipt = api.create_booking(request).await?;
    latest.record(claims.user_id, receipt.booking_id);
    Ok(HttpResponse::Ok().json(receipt))
}

pub async fn cancel_booking<B>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<BookingFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: ReservationDatabase + Analytics + AccountManagement,
{
    let booking_id = path.into_inner();
    debug!("💻️ DELETE booking {booking_id} requested by user {}", claims.user_id);
    api.cancel_booking(booking_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::ok("Booking cancelled")))
}

//----------------------------------------------   Projections  ----------------------------------------------------
pub async fn occupied_locations<B: Analytics>(
    api: web::Data<AnalyticsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let rows = api.occupied_locations().await?;
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn spots_for_address<B: Analytics>(
    path: web::Path<String>,
    api: web::Data<AnalyticsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let address = path.into_inner();
    let spots = api.spots_for_address(&address).await?;
    info!("💻️ Found {} spots for {address}", spots.len());
    Ok(HttpResponse::Ok().json(spots))
}

pub async fn parking_prices<B: Analytics>(api: web::Data<AnalyticsApi<B>>) -> Result<HttpResponse, ServerError> {
    let prices = api.location_prices().await?;
    Ok(HttpResponse::Ok().json(prices))
}

//----------------------------------------------   Admin  ----------------------------------------------------
pub async fn admin_users<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    claims.require_admin()?;
    let users = api.all_users().await?;
    let rows: Vec<_> = users
        .into_iter()
        .map(|(user, role)| {
            json!({
                "user_id": user.id,
                "username": user.username,
                "email": user.email,
                "role": role,
                "status": user.status,
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn admin_update_user_status<B: AccountManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
    body: web::Json<UserStatusUpdate>,
) -> Result<HttpResponse, ServerError> {
    claims.require_admin()?;
    let user_id = path.into_inner();
    let status = UserStatus::from_str(&body.status).map_err(|e| ServerError::ValidationError(e.to_string()))?;
    api.update_user_status(user_id, status).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::ok(format!("User {user_id} status updated to {status}"))))
}

pub async fn admin_locations<B: Analytics>(
    claims: JwtClaims,
    api: web::Data<AnalyticsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    claims.require_admin()?;
    let locations = api.all_locations().await?;
    Ok(HttpResponse::Ok().json(locations))
}

pub async fn admin_spots_for_location<B: Analytics>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AnalyticsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    claims.require_admin()?;
    let location_id = path.into_inner();
    let spots = api.spots_for_location(location_id).await?;
    let mut floors: Vec<Option<String>> = spots.iter().map(|s| s.floor.clone()).collect();
    floors.sort();
    floors.dedup();
    Ok(HttpResponse::Ok().json(json!({ "floors": floors, "spots": spots })))
}

/// Admin availability override. Freeing a spot cascades: each user's most recent booking on it is
/// cancelled with an audit record, vehicles are detached, and the users get a cancellation notice.
pub async fn admin_set_spot_status<B>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<BookingFlowApi<B>>,
    body: web::Json<SpotStatusUpdate>,
) -> Result<HttpResponse, ServerError>
where
    B: ReservationDatabase + Analytics + AccountManagement,
{
    claims.require_admin()?;
    let spot_id = path.into_inner();
    let cancelled = api.set_spot_availability(spot_id, body.is_available).await?;
    info!("💻️ Admin set spot {spot_id} availability to {}; {} booking(s) cancelled", body.is_available, cancelled.len());
    Ok(HttpResponse::Ok().json(json!({ "success": true, "cancelled_bookings": cancelled.len() })))
}

pub async fn admin_set_spot_price<B>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<BookingFlowApi<B>>,
    body: web::Json<SpotPriceUpdate>,
) -> Result<HttpResponse, ServerError>
where
    B: ReservationDatabase + Analytics + AccountManagement,
{
    claims.require_admin()?;
    let spot_id = path.into_inner();
    let price = Cents::from_fractional(body.price * 100.0);
    api.update_spot_price(spot_id, price).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::ok(format!("Spot {spot_id} price updated"))))
}

pub async fn admin_user_bookings<B: AccountManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    claims.require_admin()?;
    let user_id = path.into_inner();
    let bookings = api.bookings_for_user(user_id).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

pub async fn admin_analytics_bookings<B: Analytics>(
    claims: JwtClaims,
    range: web::Query<DateRange>,
    api: web::Data<AnalyticsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    claims.require_admin()?;
    let rows = api.bookings_per_location(range.since, range.until).await?;
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn admin_analytics_spots<B: Analytics>(
    claims: JwtClaims,
    range: web::Query<DateRange>,
    api: web::Data<AnalyticsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    claims.require_admin()?;
    let rows = api.busiest_spots(range.since, range.until).await?;
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn admin_analytics_revenue<B: Analytics>(
    claims: JwtClaims,
    range: web::Query<DateRange>,
    api: web::Data<AnalyticsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    claims.require_admin()?;
    let rows = api.revenue_by_location_and_day(range.since, range.until).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Administrative payment reversal. Note this flips the ledger row only; the booking itself is left
/// untouched (see DESIGN.md on the unlinked cancellation paths).
pub async fn admin_cancel_payment<B: PaymentLedger>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<PaymentsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    claims.require_admin()?;
    let booking_id = path.into_inner();
    let payment = api.cancel_payment(booking_id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

//----------------------------------------------   Payments  ----------------------------------------------------
/// The payment agent's lookup: the pending invoice for a user. Waits up to the configured bound
/// (15 seconds by default) for correlation data to arrive before answering 404. An exact user-id match
/// is required; the agent retries on a miss.
pub async fn pending_payment(
    path: web::Path<i64>,
    correlation: web::Data<PaymentCorrelation>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    debug!("💻️ Payment agent asked for the pending invoice of user {user_id}");
    let invoice = correlation
        .wait_for(user_id, config.payment_wait)
        .await
        .ok_or_else(|| ServerError::NoRecordFound(format!("No pending booking for user {user_id}")))?;
    Ok(HttpResponse::Ok().json(PendingPaymentResponse {
        user_id,
        booking_id: invoice.booking_id,
        amount: invoice.amount,
    }))
}

/// The payment agent's confirmation callback. Inserts the payment row (the signal that protects the
/// booking from the sweeper) and evicts the user's correlation entry.
pub async fn save_payment<B: PaymentLedger>(
    api: web::Data<PaymentsApi<B>>,
    correlation: web::Data<PaymentCorrelation>,
    body: web::Json<PaymentNotification>,
) -> Result<HttpResponse, ServerError> {
    let notification = body.into_inner();
    let user_id = notification.user_id;
    let payment = api
        .record_payment(parkside_engine::db_types::NewPayment::new(
            notification.booking_id,
            notification.user_id,
            notification.txid,
            notification.amount,
        ))
        .await?;
    correlation.remove(user_id);
    debug!("💻️ Correlation cache cleared for user {user_id}");
    Ok(HttpResponse::Ok().json(payment))
}

/// Abandoning the payment flow clears the correlation entry only. The unpaid booking row stays behind
/// for the sweeper to reclaim after the grace window.
pub async fn cancel_pending_payment(
    path: web::Path<i64>,
    correlation: web::Data<PaymentCorrelation>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let evicted = correlation
        .remove(user_id)
        .ok_or_else(|| ServerError::NoRecordFound(format!("No pending booking for user {user_id}")))?;
    info!("💻️ Pending payment for booking {} abandoned by user {user_id}", evicted.booking_id);
    Ok(HttpResponse::Ok().json(JsonResponse::ok("Booking payment cancelled")))
}

pub async fn payment_receipt<B: PaymentLedger>(
    path: web::Path<i64>,
    api: web::Data<PaymentsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let booking_id = path.into_inner();
    let payment = api
        .receipt(booking_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No payment recorded for booking {booking_id}")))?;
    Ok(HttpResponse::Ok().json(payment))
}
