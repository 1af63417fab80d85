pub mod product_fetcher;

pub use product_fetcher::*;
