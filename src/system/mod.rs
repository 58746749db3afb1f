//! # System Interaction Layer
//!
//! This module provides the boundary between the core lifecycle protocol and
//! the container runtime. The core only speaks the `ExecutionChannel` trait;
//! the process management specifics of `docker exec` live here.

pub mod executor;
