pub mod response;

pub use response::{CacheStats, CacheStrategy, ResponseCache};
