//! MariaDB account resource implementation

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
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::NumberBetween;

use crate::api::mariadb::account::{AccountKey, CreateAccountRequest};
use crate::helper::{compose_id, i64_opt, log_elapsed, set_i64_opt, split_id, string_opt};
use crate::resources::{api_error, downcast_provider_data, not_configured};
use crate::TencentCloudProviderData;

#[derive(Default)]
pub struct MariadbAccountResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl MariadbAccountResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn account_key(id: &str) -> Result<AccountKey, Diagnostic> {
    let mut parts = split_id(id, 3)?.into_iter();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(instance_id), Some(user_name), Some(host)) => Ok(AccountKey {
            instance_id,
            user_name,
            host,
        }),
        _ => Err(Diagnostic::error("Invalid resource ID", id.to_string())),
    }
}

#[async_trait]
impl Resource for MariadbAccountResource {
    fn type_name(&self) -> &str {
        "tencentcloud_mariadb_account"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Provides a MariaDB database account")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("`instance_id#user_name#host`")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("instance_id", AttributeType::String)
                    .description("Instance ID")
                    .required()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("user_name", AttributeType::String)
                    .description("Account name")
                    .required()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("host", AttributeType::String)
                    .description("Host the account may connect from, `%` for any")
                    .required()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("password", AttributeType::String)
                    .description("Account password")
                    .required()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("read_only", AttributeType::Number)
                    .description("Whether the account is read only: 0 no, 1 yes")
                    .optional()
                    .computed()
                    .validator(NumberBetween::create(0.0, 1.0))
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Account description")
                    .optional()
                    .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_account.create");
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

        let create_request = match extract_create_request(&request.config) {
            Ok(create_request) => create_request,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        if let Err(e) = provider_data
            .client
            .mariadb()
            .accounts()
            .create(&ctx, &create_request)
            .await
        {
            diagnostics.push(api_error("Failed to create MariaDB account", e));
            return CreateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            };
        }

        let mut state = request.planned_state;
        let _ = state.set_string(
            &AttributePath::new("id"),
            compose_id(&[
                &create_request.instance_id,
                &create_request.user_name,
                &create_request.host,
            ]),
        );
        set_i64_opt(
            &mut state,
            "read_only",
            Some(create_request.read_only.unwrap_or_default()),
        );

        CreateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_account.read");
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

        let key = match request
            .current_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| account_key(&id))
        {
            Ok(key) => key,
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

        match provider_data.client.mariadb().accounts().get(&ctx, &key).await {
            Ok(Some(account)) => {
                let mut state = request.current_state.clone();
                let _ = state.set_string(&AttributePath::new("instance_id"), key.instance_id);
                let _ = state.set_string(&AttributePath::new("user_name"), account.user_name);
                let _ = state.set_string(&AttributePath::new("host"), account.host);
                set_i64_opt(&mut state, "read_only", account.read_only);
                let description_path = AttributePath::new("description");
                match account.description.filter(|d| !d.is_empty()) {
                    Some(description) => {
                        let _ = state.set_string(&description_path, description);
                    }
                    None => {
                        let _ = state.set_null(&description_path);
                    }
                }

                ReadResourceResponse {
                    new_state: Some(state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                }
            }
            Ok(None) => {
                tracing::warn!(
                    instance_id = %key.instance_id,
                    user_name = %key.user_name,
                    "MariaDB account not found, removing from state"
                );
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                    deferred: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read MariaDB account", e));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                }
            }
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_account.update");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };
        let accounts = provider_data.client.mariadb().accounts();

        let key = match request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| account_key(&id))
        {
            Ok(key) => key,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let description_path = AttributePath::new("description");
        let old_description = string_opt(&request.prior_state, &description_path);
        let new_description = string_opt(&request.planned_state, &description_path);
        if old_description != new_description {
            let description = new_description.unwrap_or_default();
            if let Err(e) = accounts.modify_description(&ctx, &key, &description).await {
                diagnostics.push(api_error("Failed to update MariaDB account description", e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        }

        let password_path = AttributePath::new("password");
        let old_password = string_opt(&request.prior_state, &password_path);
        let new_password = string_opt(&request.planned_state, &password_path);
        if let Some(password) = new_password.filter(|p| Some(p) != old_password.as_ref()) {
            if let Err(e) = accounts.reset_password(&ctx, &key, &password).await {
                diagnostics.push(api_error("Failed to reset MariaDB account password", e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        }

        UpdateResourceResponse {
            new_state: request.planned_state,
            private: vec![],
            diagnostics,
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_account.delete");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return DeleteResourceResponse { diagnostics };
            }
        };

        let key = match request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| account_key(&id))
        {
            Ok(key) => key,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        match provider_data.client.mariadb().accounts().delete(&ctx, &key).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("Failed to delete MariaDB account", e)),
        }

        DeleteResourceResponse { diagnostics }
    }
}

fn extract_create_request(config: &DynamicValue) -> Result<CreateAccountRequest, Diagnostic> {
    let required = |name: &str| {
        string_opt(config, &AttributePath::new(name)).ok_or_else(|| {
            Diagnostic::error(
                format!("Missing {}", name),
                format!("The '{}' attribute is required", name),
            )
            .with_attribute(AttributePath::new(name))
        })
    };

    Ok(CreateAccountRequest {
        instance_id: required("instance_id")?,
        user_name: required("user_name")?,
        host: required("host")?,
        password: required("password")?,
        read_only: i64_opt(config, &AttributePath::new("read_only")),
        description: string_opt(config, &AttributePath::new("description")),
    })
}

#[async_trait]
impl ResourceWithConfigure for MariadbAccountResource {
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
impl ResourceWithImportState for MariadbAccountResource {
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
        if let Err(diag) = account_key(&request.id) {
            response.diagnostics.push(diag);
            return response;
        }
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[cfg(test)]
#[path = "./resource_account_test.rs"]
mod resource_account_test;
