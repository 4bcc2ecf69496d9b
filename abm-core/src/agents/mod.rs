pub mod firm;
pub mod household;

pub use firm::{Firm, FirmOutcome};
pub use household::Household;
