//! Database queries

pub mod company;
pub mod contact;
pub mod property;
