pub mod reference_loader;

pub use reference_loader::*;
