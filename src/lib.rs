pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod eutils;
pub mod mapping;
pub mod output;
pub mod parser;
pub mod populate;
pub mod record;
pub mod resolver;
pub mod strategy;
