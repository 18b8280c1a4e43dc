//! Unit tests for the claw CLI
//!
//! These tests use in-memory fakes of the engine, process runner and
//! filesystem ports, and run without Docker.

mod agent_add_service;
mod architecture;
mod doctor_service;
mod health_service;
mod helpers;
mod lifecycle_service;
mod up_service;
