// Metric normalization domain
pub mod metrics;

// Fitness results and ranking
pub mod fitness;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
