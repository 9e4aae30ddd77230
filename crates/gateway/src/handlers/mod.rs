//! API handlers module

pub mod admin;
pub mod health;
pub mod proposals;
pub mod search;
pub mod workflow;
