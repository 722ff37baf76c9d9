pub mod checksum;
pub mod fetch;

pub use fetch::ensure_helper;
