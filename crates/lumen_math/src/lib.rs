// Re-export glam for convenience
pub use glam::*;

mod onb;
mod ray;

pub use onb::Onb;
pub use ray::Ray;
