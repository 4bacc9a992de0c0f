pub mod api;
pub mod data_sources;
pub mod helper;
pub mod provider_data;
pub mod resources;

pub use provider_data::TencentCloudProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory, ValidateProviderConfigRequest,
    ValidateProviderConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue, ServerCapabilities};
use tfplug::validator::StringOneOf;

use api::{ClientConfig, RetryConfig};

pub const ENV_SECRET_ID: &str = "TENCENTCLOUD_SECRET_ID";
pub const ENV_SECRET_KEY: &str = "TENCENTCLOUD_SECRET_KEY";
pub const ENV_SECURITY_TOKEN: &str = "TENCENTCLOUD_SECURITY_TOKEN";
pub const ENV_REGION: &str = "TENCENTCLOUD_REGION";
pub const ENV_PROTOCOL: &str = "TENCENTCLOUD_PROTOCOL";
pub const ENV_DOMAIN: &str = "TENCENTCLOUD_DOMAIN";
pub const ENV_ENDPOINT: &str = "TENCENTCLOUD_ENDPOINT";

pub struct TencentCloudProvider {
    provider_data: Option<TencentCloudProviderData>,
    retry: RetryConfig,
}

impl Default for TencentCloudProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TencentCloudProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
            retry: RetryConfig::default(),
        }
    }

    /// Override retry and polling intervals for every client this provider builds.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Config value first, then the environment; empty strings count as unset.
fn config_or_env(config: &DynamicValue, name: &str, env: &str) -> Option<String> {
    config
        .get_string_opt(&AttributePath::new(name))
        .ok()
        .flatten()
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var(env).ok().filter(|s| !s.is_empty()))
}

fn required(value: Option<String>, name: &str, env: &str) -> Result<String, Diagnostic> {
    value.ok_or_else(|| {
        Diagnostic::error(
            format!("{} is required", name),
            format!("Set `{}` in the provider block or the {} environment variable", name, env),
        )
        .with_attribute(AttributePath::new(name))
    })
}

#[async_trait]
impl Provider for TencentCloudProvider {
    fn type_name(&self) -> &str {
        "tencentcloud"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
            server_capabilities: ServerCapabilities::default(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Terraform provider for Tencent Cloud MariaDB and MPS")
            .attribute(
                AttributeBuilder::new("secret_id", AttributeType::String)
                    .description("Tencent Cloud SecretId. Can also be set with TENCENTCLOUD_SECRET_ID")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("secret_key", AttributeType::String)
                    .description("Tencent Cloud SecretKey. Can also be set with TENCENTCLOUD_SECRET_KEY")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("security_token", AttributeType::String)
                    .description("Temporary session token. Can also be set with TENCENTCLOUD_SECURITY_TOKEN")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("region", AttributeType::String)
                    .description("Region to manage resources in, e.g. ap-guangzhou. Can also be set with TENCENTCLOUD_REGION")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("protocol", AttributeType::String)
                    .description("API protocol, HTTPS (default) or HTTP. Can also be set with TENCENTCLOUD_PROTOCOL")
                    .optional()
                    .validator(StringOneOf::create(["HTTPS", "HTTP"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("domain", AttributeType::String)
                    .description("Root domain of the API endpoints, default tencentcloudapi.com. Can also be set with TENCENTCLOUD_DOMAIN")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("endpoint", AttributeType::String)
                    .description("Full URL used for every service instead of the per-service endpoint. Can also be set with TENCENTCLOUD_ENDPOINT")
                    .optional()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let config = &request.config;
        let mut diagnostics = vec![];

        let secret_id = required(
            config_or_env(config, "secret_id", ENV_SECRET_ID),
            "secret_id",
            ENV_SECRET_ID,
        );
        let secret_key = required(
            config_or_env(config, "secret_key", ENV_SECRET_KEY),
            "secret_key",
            ENV_SECRET_KEY,
        );
        let region = required(config_or_env(config, "region", ENV_REGION), "region", ENV_REGION);

        let (secret_id, secret_key, region) = match (secret_id, secret_key, region) {
            (Ok(id), Ok(key), Ok(region)) => (id, key, region),
            (id, key, region) => {
                diagnostics.extend(id.err());
                diagnostics.extend(key.err());
                diagnostics.extend(region.err());
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        let mut client_config =
            ClientConfig::new(secret_id, secret_key, region).with_retry_config(self.retry.clone());
        if let Some(token) = config_or_env(config, "security_token", ENV_SECURITY_TOKEN) {
            client_config = client_config.with_security_token(token);
        }
        if let Some(protocol) = config_or_env(config, "protocol", ENV_PROTOCOL) {
            client_config = client_config.with_protocol(protocol);
        }
        if let Some(domain) = config_or_env(config, "domain", ENV_DOMAIN) {
            client_config = client_config.with_domain(domain);
        }
        if let Some(endpoint) = config_or_env(config, "endpoint", ENV_ENDPOINT) {
            client_config = client_config.with_endpoint(endpoint);
        }

        match api::Client::new(client_config) {
            Ok(client) => {
                tracing::info!(region = client.region(), "Tencent Cloud provider configured");
                let provider_data = TencentCloudProviderData::new(client);
                self.provider_data = Some(provider_data.clone());
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: Some(Arc::new(provider_data)),
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                ));
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        let mut diagnostics = vec![];

        if let Ok(Some(endpoint)) = request.config.get_string_opt(&AttributePath::new("endpoint")) {
            if url::Url::parse(&endpoint).is_err() {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid endpoint",
                        format!("`{}` is not a valid URL", endpoint),
                    )
                    .with_attribute(AttributePath::new("endpoint")),
                );
            }
        }

        ValidateProviderConfigResponse { diagnostics }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
        resources.insert(
            "tencentcloud_mariadb_instance".to_string(),
            Box::new(|| Box::new(resources::MariadbInstanceResource::new())),
        );
        resources.insert(
            "tencentcloud_mariadb_account".to_string(),
            Box::new(|| Box::new(resources::MariadbAccountResource::new())),
        );
        resources.insert(
            "tencentcloud_mariadb_account_privileges".to_string(),
            Box::new(|| Box::new(resources::MariadbAccountPrivilegesResource::new())),
        );
        resources.insert(
            "tencentcloud_mariadb_security_groups".to_string(),
            Box::new(|| Box::new(resources::MariadbSecurityGroupsResource::new())),
        );
        resources.insert(
            "tencentcloud_mps_watermark_template".to_string(),
            Box::new(|| Box::new(resources::MpsWatermarkTemplateResource::new())),
        );
        resources.insert(
            "tencentcloud_mps_transcode_template".to_string(),
            Box::new(|| Box::new(resources::MpsTranscodeTemplateResource::new())),
        );
        resources.insert(
            "tencentcloud_mps_workflow".to_string(),
            Box::new(|| Box::new(resources::MpsWorkflowResource::new())),
        );
        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut data_sources: HashMap<String, DataSourceFactory> = HashMap::new();
        data_sources.insert(
            "tencentcloud_mariadb_db_instances".to_string(),
            Box::new(|| Box::new(data_sources::MariadbDbInstancesDataSource::new())),
        );
        data_sources.insert(
            "tencentcloud_mps_transcode_templates".to_string(),
            Box::new(|| Box::new(data_sources::MpsTranscodeTemplatesDataSource::new())),
        );
        data_sources.insert(
            "tencentcloud_mps_workflows".to_string(),
            Box::new(|| Box::new(data_sources::MpsWorkflowsDataSource::new())),
        );
        data_sources
    }
}
