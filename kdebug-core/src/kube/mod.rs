pub mod model;
pub mod resolver;

pub use model::{Container, Namespace, Pod};
pub use resolver::Resolver;
