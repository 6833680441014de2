//! Type definitions

pub mod company;
pub mod contact;
pub mod import;
pub mod messages;
pub mod property;

pub use company::*;
pub use contact::*;
pub use import::*;
pub use messages::*;
pub use property::*;
