pub mod engine;
pub mod envelope;
pub mod error;
pub mod jobdef;
pub mod render;

pub use error::{LifeError, Result};
