//! Connectors module
//!
//! This module provides the stream SDK including:
//! - The `HttpStream` trait with the shared request loop
//! - Resource metadata and the registry used for discovery and lookup
//! - The Jurnal source built on top of them

pub mod jurnal;
pub mod metadata;
pub mod registry;
pub mod resources;
pub mod trait_;

pub use jurnal::{CheckError, ConnectionCheck, JurnalSource, JurnalStream, SourceError};
pub use metadata::{FieldKind, FieldSpec, ResourceDefinition, StreamMetadata, SyncMode};
pub use registry::{Registry, RegistryError};
pub use trait_::{HttpStream, PageToken};
