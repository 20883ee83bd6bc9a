//! Network layer - async gateway execution

pub mod actor;
pub mod client;

pub use actor::NetworkActor;
pub use client::Gateway;
