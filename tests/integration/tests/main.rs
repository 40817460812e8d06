//! End-to-End Integration Tests
//!
//! These tests build requests from a JSON settings fixture, push them
//! through the transport bindings and check signatures against
//! OpenSSL-generated keys and signatures.

mod common;
mod authn_request;
mod security_key;
