// clinic_shop/src/web/routes.rs

use actix_web::{web, HttpResponse};

use crate::web::handlers::{cart_handlers, checkout_handlers, order_handlers, product_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/health", web::get().to(health_check_handler))
    .service(
      web::scope("/shop")
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("/{product_id}", web::get().to(product_handlers::get_product_handler)),
        )
        .service(
          web::scope("/cart")
            .route("", web::get().to(cart_handlers::view_cart_handler))
            .route("", web::post().to(cart_handlers::add_to_cart_handler))
            .route("/{item_id}", web::put().to(cart_handlers::update_cart_item_handler))
            .route("/{item_id}", web::delete().to(cart_handlers::remove_cart_item_handler)),
        )
        .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
        .service(
          web::scope("/orders")
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
        ),
    );
}
