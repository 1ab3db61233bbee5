// This file exposes the modules as public modules in the crate

pub mod errors;
pub mod models;
pub mod app_config;
pub mod catalog;
pub mod wizard;
pub mod schema;
pub mod prompts;
pub mod llm_handler;
pub mod generator;
pub mod portfolio;
pub mod datastore;
pub mod identity;
pub mod requirement_store;
pub mod result_store;
pub mod remix_store;
pub mod account;
pub mod app_state;
pub mod catalog_handlers;
pub mod requirement_handlers;
pub mod result_handlers;
pub mod remix_handlers;
pub mod generation_handlers;
pub mod account_handlers;
pub mod routes;
