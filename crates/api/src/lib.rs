//! HTTP API: task inspection, manual triggers and the test-mail endpoint.

pub mod app;
