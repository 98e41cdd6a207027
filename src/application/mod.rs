// Cross-configuration totals and ranking
pub mod aggregator;

// Per-configuration scoring engine
pub mod evaluator;

// Transport-to-router bridge
pub mod ingest;

// Per-metric ingestion queues
pub mod router;
