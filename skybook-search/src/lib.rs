pub mod engine;
pub mod key;
pub mod window;

pub use engine::{SearchEngine, SearchRules};
