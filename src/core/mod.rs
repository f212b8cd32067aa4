pub mod config;
pub mod deferred;
pub mod filter;
pub mod messages;
pub mod navigator;
pub mod path;
pub mod pipeline;
pub mod resolver;
pub mod scanner;
pub mod screens;
