pub mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod gallery;
pub mod media;
pub mod metrics;
pub mod migrator;
pub mod pages;
pub mod pipeline;
pub mod session;
pub mod social;
pub mod store;
pub mod telemetry;

pub use sea_orm;
