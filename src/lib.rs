//! Dealdesk - Conversational Deal-Closing Sessions
//!
//! This crate implements per-listing buyer conversations for a real-estate
//! marketplace: an AI autopilot pitches the listing and answers questions,
//! human agents can take over live, and detected deal intent funnels into
//! exactly-once lead capture.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
