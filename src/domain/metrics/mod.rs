// Running time-integral of normalized scores
pub mod accumulator;

// Piecewise normalization curve mathematics
pub mod curve;

// Metric definitions and shape parameters
pub mod definition;

// Definition ownership and cached curves
pub mod registry;

// Raw sample wire type
pub mod sample;

// Improvement sense (minimize / maximize / seek value)
pub mod sense;
