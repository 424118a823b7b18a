pub mod analytics;
pub mod config;
pub mod generator;
pub mod montecarlo;
pub mod pipeline;
pub mod precision;
pub mod roots;
pub mod stats;
pub mod store;
pub mod thermal;
pub mod trend;
