pub mod budget;
pub mod classifier;
pub mod config;
pub mod context;
pub mod detector;
pub mod error;
pub mod markdown;
pub mod mission;
pub mod paths;
pub mod product;
pub mod roadmap;
pub mod standards;
pub mod types;
pub mod validator;

pub use error::{Red64Error, Result};
