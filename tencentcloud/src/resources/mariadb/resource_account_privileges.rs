//! MariaDB account global privileges resource

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
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use crate::api::mariadb::privileges::Account;
use crate::api::{ApiError, Client};
use crate::helper::{block_value, compose_id, log_elapsed, split_id, string_list, string_opt};
use crate::resources::{api_error, downcast_provider_data, not_configured};
use crate::TencentCloudProviderData;

#[derive(Default)]
pub struct MariadbAccountPrivilegesResource {
    provider_data: Option<TencentCloudProviderData>,
}

impl MariadbAccountPrivilegesResource {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Instance and account addressed by `instance_id#user#host`.
fn parse_id(id: &str) -> Result<(String, Account), Diagnostic> {
    let mut parts = split_id(id, 3)?.into_iter();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(instance_id), Some(user), Some(host)) => Ok((instance_id, Account { user, host })),
        _ => Err(Diagnostic::error("Invalid resource ID", id.to_string())),
    }
}

fn extract_account(config: &DynamicValue) -> Result<Account, Diagnostic> {
    let missing = || {
        Diagnostic::error(
            "Missing accounts",
            "Exactly one `accounts` block with `user` and `host` is required",
        )
        .with_attribute(AttributePath::new("accounts"))
    };
    let accounts = config
        .get_list(&AttributePath::new("accounts"))
        .map_err(|_| missing())?;
    let account = accounts.first().ok_or_else(missing)?;
    let field = |name: &str| {
        account
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(missing)
    };
    Ok(Account {
        user: field("user")?,
        host: field("host")?,
    })
}

fn account_block(account: &Account) -> Dynamic {
    block_value([
        ("user", Some(Dynamic::from(account.user.as_str()))),
        ("host", Some(Dynamic::from(account.host.as_str()))),
    ])
}

/// Apply `privileges` and wait for the resulting flow.
async fn apply_privileges(
    ctx: &Context,
    client: &Client,
    instance_id: &str,
    account: &Account,
    privileges: &[String],
) -> Result<(), ApiError> {
    let mariadb = client.mariadb();
    let flow_id = mariadb
        .privileges()
        .modify_global(ctx, instance_id, account, privileges)
        .await?;
    tracing::debug!(flow_id, instance_id, user = %account.user, "waiting for privilege flow");
    mariadb
        .wait_flow(ctx, flow_id, client.retry_config().write_timeout)
        .await
}

#[async_trait]
impl Resource for MariadbAccountPrivilegesResource {
    fn type_name(&self) -> &str {
        "tencentcloud_mariadb_account_privileges"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Provides the global privileges of a MariaDB account")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
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
                AttributeBuilder::new(
                    "global_privileges",
                    AttributeType::set_of(AttributeType::String),
                )
                .description(
                    "Global privileges, e.g. SELECT, INSERT, UPDATE, DELETE, CREATE, DROP, \
                     ALTER, INDEX, PROCESS, SHOW DATABASES",
                )
                .optional()
                .build(),
            )
            .block(
                NestedBlockBuilder::single_list("accounts")
                    .description("The account the privileges belong to")
                    .attribute(
                        AttributeBuilder::new("user", AttributeType::String)
                            .description("Account name")
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("host", AttributeType::String)
                            .description("Account host")
                            .required()
                            .build(),
                    )
                    .min_items(1)
                    .requires_replace()
                    .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_account_privileges.create");
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

        let instance_id = string_opt(&request.config, &AttributePath::new("instance_id"));
        let target = extract_account(&request.config).and_then(|account| {
            instance_id.map(|id| (id, account)).ok_or_else(|| {
                Diagnostic::error("Missing instance_id", "The 'instance_id' attribute is required")
                    .with_attribute(AttributePath::new("instance_id"))
            })
        });
        let (instance_id, account) = match target {
            Ok(target) => target,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let privileges = string_list(&request.config, &AttributePath::new("global_privileges"));
        if let Err(e) =
            apply_privileges(&ctx, &provider_data.client, &instance_id, &account, &privileges).await
        {
            diagnostics.push(api_error("Failed to grant MariaDB account privileges", e));
            return CreateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            };
        }

        let mut state = request.planned_state;
        let _ = state.set_string(
            &AttributePath::new("id"),
            compose_id(&[&instance_id, &account.user, &account.host]),
        );

        CreateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_account_privileges.read");
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

        let (instance_id, account) = match request
            .current_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| parse_id(&id))
        {
            Ok(parsed) => parsed,
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

        match provider_data
            .client
            .mariadb()
            .privileges()
            .describe_global(&ctx, &instance_id, &account)
            .await
        {
            Ok(Some(mut privileges)) => {
                privileges.sort();
                let mut state = request.current_state.clone();
                let _ = state.set_string(&AttributePath::new("instance_id"), instance_id);
                let _ = state.set_value(&AttributePath::new("accounts"), account_block(&account));
                let _ = state.set_value(
                    &AttributePath::new("global_privileges"),
                    Dynamic::string_list(privileges),
                );
                ReadResourceResponse {
                    new_state: Some(state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                }
            }
            Ok(None) => {
                tracing::warn!(
                    instance_id = %instance_id,
                    user = %account.user,
                    "MariaDB account not found, removing privileges from state"
                );
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                    deferred: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read MariaDB account privileges", e));
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
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_account_privileges.update");
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

        let (instance_id, account) = match request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| parse_id(&id))
        {
            Ok(parsed) => parsed,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let path = AttributePath::new("global_privileges");
        let mut old = string_list(&request.prior_state, &path);
        let mut new = string_list(&request.planned_state, &path);
        old.sort();
        new.sort();
        if old != new {
            if let Err(e) =
                apply_privileges(&ctx, &provider_data.client, &instance_id, &account, &new).await
            {
                diagnostics.push(api_error("Failed to update MariaDB account privileges", e));
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
        let _elapsed = log_elapsed(&ctx, "resource.tencentcloud_mariadb_account_privileges.delete");
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return DeleteResourceResponse { diagnostics };
            }
        };

        let (instance_id, account) = match request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Missing resource ID", e.to_string()))
            .and_then(|id| parse_id(&id))
        {
            Ok(parsed) => parsed,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        match apply_privileges(&ctx, &provider_data.client, &instance_id, &account, &[]).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("Failed to revoke MariaDB account privileges", e)),
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for MariadbAccountPrivilegesResource {
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
impl ResourceWithImportState for MariadbAccountPrivilegesResource {
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
        if let Err(diag) = parse_id(&request.id) {
            response.diagnostics.push(diag);
            return response;
        }
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[cfg(test)]
#[path = "./resource_account_privileges_test.rs"]
mod resource_account_privileges_test;
