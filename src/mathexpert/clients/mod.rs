//! Provider specific [`ClientWrapper`](crate::client_wrapper::ClientWrapper) implementations.
//!
//! The math expert talks to Claude through Amazon Bedrock's Converse API.

pub mod common;

pub mod bedrock;
