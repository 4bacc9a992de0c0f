//! Generated protocol buffer types.
//!
//! `tfplugin6` is the Terraform plugin protocol; `controller` and `health` are
//! the two auxiliary services go-plugin expects every plugin to serve.
//!
//! Several generated names collide with framework types (`DynamicValue`,
//! `Diagnostic`, `Schema`), so always refer to these through the `proto::`
//! prefix.

include!(concat!(env!("OUT_DIR"), "/tfplugin6.rs"));

pub use provider_server::{Provider as ProviderService, ProviderServer};

pub mod controller {
    include!(concat!(env!("OUT_DIR"), "/plugin.rs"));

    pub use grpc_controller_server::{GrpcController, GrpcControllerServer};
}

pub mod health {
    include!(concat!(env!("OUT_DIR"), "/grpc.health.v1.rs"));

    pub use health_server::{Health, HealthServer};
}
