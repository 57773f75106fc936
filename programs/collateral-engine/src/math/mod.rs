//! Fixed-point arithmetic support

pub mod u256;

pub use u256::{mul_div_floor, mul_div_saturating, U256};
