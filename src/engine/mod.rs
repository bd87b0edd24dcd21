pub mod progress;
pub mod translate;
