//! Terraform plugin protocol v6 for Rust providers.
//!
//! A provider implements [`Provider`] and returns factories for its
//! resources and data sources. [`serve`] performs the go-plugin handshake
//! and exposes the provider over gRPC; [`grpc::GrpcProviderServer`] does the
//! protocol work (plan conformance, unknown marking, private state) so the
//! resource implementations only deal with [`DynamicValue`]s.

pub mod context;
pub mod error;
pub mod schema;
pub mod types;

pub mod data_source;
pub mod provider;
pub mod resource;

pub mod defaults;
pub mod import;
pub mod plan_modifier;
pub mod validator;

pub mod grpc;
pub mod proto;
pub mod server;

pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use import::import_state_passthrough_id;
pub use provider::{DataSourceFactory, Provider, ResourceFactory};
pub use resource::{
    Resource, ResourceWithConfigure, ResourceWithImportState, ResourceWithModifyPlan,
    ResourceWithUpgradeState,
};
pub use schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder};
pub use server::{serve, ServerConfig};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
