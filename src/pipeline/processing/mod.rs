// Transform stage: cleaning -> classification -> aggregation

pub mod aggregate;
pub mod classify;
pub mod cleaning;
pub mod transform;

pub use aggregate::aggregate;
pub use classify::{classify, location_zone, risk_level};
pub use cleaning::clean;
pub use transform::{compute, TransformReport, TransformStage};
