pub mod clearing;

pub use clearing::*;
