//! Resource implementations

pub mod mariadb;
pub mod mps;

pub use mariadb::{
    MariadbAccountPrivilegesResource, MariadbAccountResource, MariadbInstanceResource,
    MariadbSecurityGroupsResource,
};
pub use mps::{MpsTranscodeTemplateResource, MpsWatermarkTemplateResource, MpsWorkflowResource};

use std::any::Any;
use std::sync::Arc;
use tfplug::types::Diagnostic;

use crate::api::ApiError;
use crate::TencentCloudProviderData;

/// Pull the provider data out of a configure request, shared by resources
/// and data sources.
pub(crate) fn downcast_provider_data(
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
    kind: &str,
) -> Result<TencentCloudProviderData, Diagnostic> {
    match provider_data {
        Some(data) => data
            .downcast_ref::<TencentCloudProviderData>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!("Failed to downcast provider data to TencentCloudProviderData");
                Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract TencentCloudProviderData from provider data",
                )
            }),
        None => Err(Diagnostic::error(
            "No provider data",
            format!("No provider data was provided to the {}", kind),
        )),
    }
}

pub(crate) fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

pub(crate) fn api_error(summary: &str, err: ApiError) -> Diagnostic {
    Diagnostic::error(summary, format!("API error: {}", err))
}
