//! Special functions and tail probabilities used by the power-law engine.

pub mod math;

pub use math::binomial;
pub use math::gamma::*;
pub use math::normal::*;
pub use math::stable::*;
pub use math::zeta::*;
