pub mod config;
pub mod error;
pub mod release;

pub use config::Config;
pub use error::{KdebugError, Result};
pub use release::{BinaryArtifact, HelperRelease, Platform};
