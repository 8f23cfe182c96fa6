pub mod aggregate;
pub mod fetch;
pub mod names;
pub mod pitch;
pub mod reader;
pub mod traits;
