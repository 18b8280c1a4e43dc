//! Integration tests for the claw CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! None of them need a running container engine.

mod agent_command;
mod cli_tests;
mod pod_commands;
