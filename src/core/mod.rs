pub mod cache;
pub mod services;
pub mod time;
pub mod utils;

pub use cache::DirectoryCache;
