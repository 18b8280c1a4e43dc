//! Host-side runtime artifacts under `<pod>/.claw-runtime/`.
//!
//! Everything here touches the filesystem but never spawns a process:
//! contract and skill resolution, proxy tokens, per-agent context
//! directories, and generated skills.

pub mod context;
pub mod contract;
pub mod files;
pub mod skills;
pub mod tokens;

pub use contract::{ContractMount, resolve_contract, resolve_skills};
pub use tokens::{TokenStore, generate_token};

/// Directory name under the pod directory.
pub const RUNTIME_DIR: &str = ".claw-runtime";
