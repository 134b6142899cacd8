pub mod config;
pub mod error;
pub mod fkjoin;
pub mod logging;
pub mod processor;
pub mod serialization;
pub mod state;
pub mod topology;
