pub mod admin;
pub mod consumers;
pub mod gateway;
pub mod plugins;
pub mod services;

pub use admin::*;
pub use consumers::*;
pub use gateway::*;
pub use plugins::*;
pub use services::*;
