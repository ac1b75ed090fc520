pub mod entity;
pub mod ports;
