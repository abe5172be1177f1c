// clinic_shop/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use clinic_flow::FlowRegistry;
use clinic_shop::config::AppConfig;
use clinic_shop::errors::AppError;
use clinic_shop::pipelines;
use clinic_shop::state::AppState;
use clinic_shop::store::PgStore;
use clinic_shop::telemetry::init_tracing;
use clinic_shop::web::configure_app_routes;
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
  tracing::error!(error = %err, "{}", context);
  io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      eprintln!("Failed to load application configuration: {}", e);
      return Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()));
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!("Starting clinic shop server...");

  let db_pool = PgPoolOptions::new()
    .max_connections(app_config.database_max_connections)
    .connect(&app_config.database_url)
    .await
    .map_err(|e| startup_error("Failed to connect to the database", e))?;
  tracing::info!("Connected to the database.");

  if app_config.run_migrations {
    sqlx::migrate!("./migrations")
      .run(&db_pool)
      .await
      .map_err(|e| startup_error("Failed to run database migrations", e))?;
    tracing::info!("Database migrations applied.");
  }

  let flows = Arc::new(FlowRegistry::<AppError>::new());
  pipelines::register_all_pipelines(&flows).map_err(|e| startup_error("Failed to register pipelines", e))?;

  let app_state = AppState {
    store: Arc::new(PgStore::new(db_pool)),
    flows,
    config: app_config.clone(),
  };

  let server_address = app_config.bind_address();
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
