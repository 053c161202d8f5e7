pub mod arnold;
pub mod builder;
pub mod config;
pub mod document;
pub mod domain;
pub mod error;
pub mod extract;
pub mod lims;
pub mod orchestrator;
pub mod output;
pub mod schema;
pub mod workflow;
