// Pipeline processing: normalization, quality policies and aggregation

pub mod aggregate;
pub mod normalize;
pub mod quality_gate;
