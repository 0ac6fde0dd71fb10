mod admin;
mod checkout;
mod health;
mod login;
mod products;
mod shipping;
mod static_products;
mod translate;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::{AppState, middleware::admin_middleware};

pub fn create_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/products", get(products::list_products))
        .route("/api/products/{id}", get(products::get_product))
        .route("/api/static-products", get(static_products::get_hidden))
        .route("/api/admin/login", post(login::admin_login))
        .route("/api/translate", post(translate::translate))
        .route(
            "/create-checkout-session",
            post(checkout::create_checkout_session),
        );

    let mut admin = Router::new()
        .route("/api/products", post(admin::create_product))
        .route(
            "/api/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route(
            "/api/static-products/toggle",
            post(static_products::toggle_hidden),
        );

    if state.config.shippo.is_some() {
        admin = admin.route("/api/shipping/labels", post(shipping::create_label));
    }

    let admin = admin.route_layer(middleware::from_fn_with_state(
        state.clone(),
        admin_middleware,
    ));

    public.merge(admin)
}
