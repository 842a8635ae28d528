pub mod aggregator;
pub mod defaults;
pub mod field;
pub mod holder;
