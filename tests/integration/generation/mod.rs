//! End-to-end generation tests

mod chain_test;
mod failure_test;
mod references_test;
