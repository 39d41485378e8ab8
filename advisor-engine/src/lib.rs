pub mod controller;
pub mod hosted;
pub mod traits;
pub mod voice;
