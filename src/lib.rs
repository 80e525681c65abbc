pub mod build_plan;
pub mod changes;
pub mod cli;
pub mod config;
pub mod engine;
pub mod extract;
pub mod forge;
pub mod pipeline;
pub mod policy;
pub mod quota;
pub mod report;
pub mod reporter;
pub mod service;
pub mod util;
