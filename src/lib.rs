pub mod classifier;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod refresh;
pub mod registry;
pub mod server;
pub mod state;
pub mod store;
