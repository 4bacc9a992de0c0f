//! Binds a security group to a MariaDB instance

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, ResourceWithImportState, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic};

use crate::helper::{compose_id, log_elapsed, split_id, string_opt};
use crate::resources::{api_error, downcast_provider_data, not_configured};
use crate::TencentCloudProviderData;

const ARGS: [&str; 3] = ["instance_id", "security_group_id", "product"];

#[derive(Default)]
pub struct MariadbSecurityGroupsResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl MariadbSecurityGroupsResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, PartialEq)]
struct Binding {
    instance_id: String,
    security_group_id: String,
    product: String,
}

impl Binding {
    fn parse(id: &str) -> Result<Self, Diagnostic> {
        let mut parts = split_id(id, 3)?.into_iter();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(instance_id), Some(security_group_id), Some(product)) => Ok(Self {
                instance_id,
                security_group_id,
                product,
            }),
            _ => Err(Diagnostic::error("Invalid resource ID", id.to_string())),
        }
    }

    fn id(&self) -> String {
        compose_id(&[&self.instance_id, &self.security_group_id, &self.product])
    }
}

#[async_trait]
impl Resource for MariadbSecurityGroupsResource {
    fn type_name(&self) -> &str {
        "tencentcloud_mariadb_security_groups"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Provides a security group binding for a MariaDB instance")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            );

        let descriptions = [
            "Instance ID",
            "Security group ID",
            "Product name, fixed to `mariadb`",
        ];
        for (name, description) in ARGS.iter().zip(descriptions) {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::String)
                    .description(description)
                    .required()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            );
        }

        ResourceSchemaResponse {
            schema: builder.build(),
            diagnostics: vec![],
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_security_groups.create");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let mut values = Vec::with_capacity(ARGS.len());
        for name in ARGS {
            match string_opt(&request.config, &AttributePath::new(name)) {
                Some(value) => values.push(value),
                None => diagnostics.push(
                    Diagnostic::error(
                        format!("Missing {}", name),
                        format!("The '{}' attribute is required", name),
                    )
                    .with_attribute(AttributePath::new(name)),
                ),
            }
        }
        let [instance_id, security_group_id, product]: [String; 3] = match values.try_into() {
            Ok(values) => values,
            Err(_) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };
        let binding = Binding {
            instance_id,
            security_group_id,
            product,
        };

        if let Err(e) = provider_data
            .client
            .mariadb()
            .security_groups()
            .associate(&ctx, &binding.product, &binding.security_group_id, &binding.instance_id)
            .await
        {
            diagnostics.push(api_error("Failed to associate security group", e));
            return CreateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            };
        }

        let mut state = request.planned_state;
        let _ = state.set_string(&AttributePath::new("id"), binding.id());

        CreateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_security_groups.read");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                };
            }
        };

        let binding = match request
            .current_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| Binding::parse(&id))
        {
            Ok(binding) => binding,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                };
            }
        };

        let groups = match provider_data
            .client
            .mariadb()
            .security_groups()
            .list(&ctx, &binding.product, &binding.instance_id)
            .await
        {
            Ok(groups) => groups,
            Err(e) => {
                diagnostics.push(api_error("Failed to read MariaDB security groups", e));
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                };
            }
        };

        if !groups
            .iter()
            .any(|g| g.security_group_id == binding.security_group_id)
        {
            tracing::warn!(
                instance_id = %binding.instance_id,
                security_group_id = %binding.security_group_id,
                "security group no longer bound, removing from state"
            );
            return ReadResourceResponse {
                new_state: None,
                diagnostics,
                private: request.private,
                deferred: None,
            };
        }

        let mut state = request.current_state.clone();
        let _ = state.set_string(&AttributePath::new("instance_id"), binding.instance_id);
        let _ = state.set_string(
            &AttributePath::new("security_group_id"),
            binding.security_group_id,
        );
        let _ = state.set_string(&AttributePath::new("product"), binding.product);

        ReadResourceResponse {
            new_state: Some(state),
            diagnostics,
            private: request.private,
            deferred: None,
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        // Every argument forces replacement.
        UpdateResourceResponse {
            new_state: request.planned_state,
            private: vec![],
            diagnostics: vec![],
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_security_groups.delete");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return DeleteResourceResponse { diagnostics };
            }
        };

        let binding = match request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| Binding::parse(&id))
        {
            Ok(binding) => binding,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        match provider_data
            .client
            .mariadb()
            .security_groups()
            .disassociate(&ctx, &binding.product, &binding.security_group_id, &binding.instance_id)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("Failed to disassociate security group", e)),
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for MariadbSecurityGroupsResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];
        match downcast_provider_data(request.provider_data, "resource") {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }
        ConfigureResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithImportState for MariadbSecurityGroupsResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
            deferred: None,
        };
        if let Err(diag) = Binding::parse(&request.id) {
            response.diagnostics.push(diag);
            return response;
        }
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[cfg(test)]
#[path = "./resource_security_groups_test.rs"]
mod resource_security_groups_test;
