#![doc = "The `contacts_app` library crate."]
#![doc = ""]
#![doc = "A JSON REST backend for a personal address book: email-verified accounts,"]
#![doc = "JWT access/refresh tokens, and per-user contacts with search and upcoming birthdays."]
#![doc = "The binary (`main.rs`) loads configuration and hands everything to `startup::run`."]

pub mod config;
pub mod email_client;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod startup;

#[cfg(test)]
mod test_support;

pub use crate::error::AppError;
