//! Stream module
//!
//! This module provides the file-side primitives of the client: chunked
//! reading of the source file and append-only capture of server responses.

pub mod chunker;
pub mod sink;
