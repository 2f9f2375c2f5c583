use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use parkside_engine::{
    correlation::{LatestBookings, PaymentCorrelation, PendingInvoice},
    events::{EventHandlers, EventHooks, EventProducers},
    AccountApi,
    AnalyticsApi,
    AuthApi,
    BookingFlowApi,
    PaymentsApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        admin_analytics_bookings,
        admin_analytics_revenue,
        admin_analytics_spots,
        admin_cancel_payment,
        admin_locations,
        admin_set_spot_price,
        admin_set_spot_status,
        admin_spots_for_location,
        admin_update_user_status,
        admin_user_bookings,
        admin_users,
        add_vehicle,
        auth,
        cancel_booking,
        cancel_pending_payment,
        cancellation_notice,
        create_booking,
        health,
        my_profile,
        occupied_locations,
        parking_prices,
        payment_receipt,
        pending_payment,
        register,
        save_payment,
        spots_for_address,
    },
    sweeper::start_sweeper,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;

    // The consumer side of the payment correlation channel: payment-requested events land in the
    // correlation cache, where the payment agent's lookups find them.
    let correlation = PaymentCorrelation::default();
    let latest_bookings = LatestBookings::default();
    let cache = correlation.clone();
    let latest = latest_bookings.clone();
    let mut hooks = EventHooks::default();
    hooks.on_payment_requested(move |ev| {
        let cache = cache.clone();
        let latest = latest.clone();
        Box::pin(async move {
            info!("📬️ Payment request received: user={}, booking={}, amount={}", ev.user_id, ev.booking_id, ev.amount);
            cache.insert(ev.user_id, PendingInvoice { booking_id: ev.booking_id, amount: ev.amount });
            latest.record(ev.user_id, ev.booking_id);
        })
    });
    let handlers = EventHandlers::new(config.event_buffer_size, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let _sweeper = start_sweeper(db.clone(), producers.clone(), config.sweep_interval, config.payment_grace);

    let srv = create_server_instance(config, db, producers, correlation, latest_bookings)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
    correlation: PaymentCorrelation,
    latest_bookings: LatestBookings,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let booking_api = BookingFlowApi::new(db.clone(), producers.clone());
        let auth_api = AuthApi::new(db.clone());
        let accounts_api = AccountApi::new(db.clone());
        let analytics_api = AnalyticsApi::new(db.clone());
        let payments_api = PaymentsApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pks::access_log"))
            .app_data(web::Data::new(booking_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(analytics_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(correlation.clone()))
            .app_data(web::Data::new(latest_bookings.clone()))
            .app_data(web::Data::new(config.clone()));
        // Routes that require an access token
        let api_scope = web::scope("/api")
            .service(web::resource("/bookings").route(web::post().to(create_booking::<SqliteDatabase>)))
            .service(web::resource("/bookings/{id}").route(web::delete().to(cancel_booking::<SqliteDatabase>)))
            .service(web::resource("/vehicles").route(web::post().to(add_vehicle::<SqliteDatabase>)))
            .service(web::resource("/me").route(web::get().to(my_profile::<SqliteDatabase>)))
            .service(
                web::resource("/cancellation_notice").route(web::get().to(cancellation_notice::<SqliteDatabase>)),
            )
            .service(
                web::scope("/admin")
                    .service(web::resource("/users").route(web::get().to(admin_users::<SqliteDatabase>)))
                    .service(
                        web::resource("/users/{id}/status")
                            .route(web::put().to(admin_update_user_status::<SqliteDatabase>)),
                    )
                    .service(web::resource("/locations").route(web::get().to(admin_locations::<SqliteDatabase>)))
                    .service(
                        web::resource("/locations/{id}/spots")
                            .route(web::get().to(admin_spots_for_location::<SqliteDatabase>)),
                    )
                    .service(
                        web::resource("/spots/{id}/status")
                            .route(web::put().to(admin_set_spot_status::<SqliteDatabase>)),
                    )
                    .service(
                        web::resource("/spots/{id}/price")
                            .route(web::put().to(admin_set_spot_price::<SqliteDatabase>)),
                    )
                    .service(
                        web::resource("/bookings/{user_id}")
                            .route(web::get().to(admin_user_bookings::<SqliteDatabase>)),
                    )
                    .service(
                        web::resource("/analytics/bookings")
                            .route(web::get().to(admin_analytics_bookings::<SqliteDatabase>)),
                    )
                    .service(
                        web::resource("/analytics/spots")
                            .route(web::get().to(admin_analytics_spots::<SqliteDatabase>)),
                    )
                    .service(
                        web::resource("/analytics/revenue")
                            .route(web::get().to(admin_analytics_revenue::<SqliteDatabase>)),
                    )
                    .service(
                        web::resource("/payments/{booking_id}/cancel")
                            .route(web::put().to(admin_cancel_payment::<SqliteDatabase>)),
                    ),
            );
        // The payment agent's surface
        let payments_scope = web::scope("/payments")
            .service(web::resource("").route(web::post().to(save_payment::<SqliteDatabase>)))
            .service(web::resource("/pending/{user_id}").route(web::get().to(pending_payment)))
            .service(web::resource("/cancel/{user_id}").route(web::post().to(cancel_pending_payment)))
            .service(web::resource("/receipt/{booking_id}").route(web::get().to(payment_receipt::<SqliteDatabase>)));
        app.service(health)
            .service(web::resource("/auth").route(web::post().to(auth::<SqliteDatabase>)))
            .service(web::resource("/users").route(web::post().to(register::<SqliteDatabase>)))
            .service(web::resource("/occupied_locations").route(web::get().to(occupied_locations::<SqliteDatabase>)))
            .service(
                web::resource("/locations/{address}/spots")
                    .route(web::get().to(spots_for_address::<SqliteDatabase>)),
            )
            .service(web::resource("/parking_prices").route(web::get().to(parking_prices::<SqliteDatabase>)))
            .service(api_scope)
            .service(payments_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
