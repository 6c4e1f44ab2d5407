//! Core engine for the council service: a provider-abstraction layer over
//! several remote text-generation APIs, a coordinator that fans queries out
//! across them, and an orchestrator that runs a three-round simulated
//! deliberation among a fixed cast of advisors, exposed as a pull-driven
//! event sequence.

pub mod coordinator;
pub mod council;
pub mod message;
pub mod providers;
