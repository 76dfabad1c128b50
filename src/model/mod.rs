pub mod forecast;
pub mod signal;
