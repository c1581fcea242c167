//! End-to-end tests for the check flow, history maintenance and the binary.

pub mod check_flow_test;
pub mod cli_test;
pub mod history_test;
