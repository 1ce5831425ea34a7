pub mod catalog;
pub mod config;
pub mod dataset;
pub mod extract;
pub mod importers;
pub mod output;
pub mod services;
