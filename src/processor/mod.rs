pub mod price_calculator;
pub mod reconciler;

pub use price_calculator::*;
pub use reconciler::*;
