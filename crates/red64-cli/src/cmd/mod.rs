pub mod budget;
pub mod classify;
pub mod config;
pub mod hook;
pub mod product;
pub mod standards;
