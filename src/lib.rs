pub mod calendar;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod model;
pub mod output;
pub mod parser;
pub mod stats;
