pub mod eref;
pub mod observer;
pub mod uuid;
