//! Counsel Desk - Counselling Service Coordination Backend
//!
//! This crate implements the session/case lifecycle engine of a student
//! counselling service: session requests, acceptance, rescheduling,
//! cancellation, case closure, referrals between counsellors, and the
//! notification fan-out accompanying every transition. HTTP controllers,
//! authentication, and report rendering live outside this crate and
//! consume it through the application handlers.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
