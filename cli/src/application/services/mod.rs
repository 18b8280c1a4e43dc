//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services never import from `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod agent_add;
pub mod build;
pub mod doctor;
pub mod health;
pub mod inspect;
pub mod lifecycle;
pub mod up;
