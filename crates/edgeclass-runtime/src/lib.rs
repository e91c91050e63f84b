pub mod config;
pub mod device;
pub mod pipeline;
pub mod preprocess;
pub mod rank;
pub mod request;

pub use config::*;
pub use device::*;
pub use pipeline::*;
pub use preprocess::*;
pub use rank::*;
pub use request::*;
