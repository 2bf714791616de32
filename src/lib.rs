pub mod app;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod labels;
pub mod model;
pub mod output;
pub mod projector;
pub mod resolver;
pub mod store;
pub mod table;
