// clinic_shop/src/lib.rs

//! Pet-clinic shop: catalog, cart and the checkout orchestrator behind
//! `POST /shop/checkout`.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod pricing;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod web;
