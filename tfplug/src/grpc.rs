//! gRPC service implementing Terraform plugin protocol v6.
//!
//! Resources and data sources are created per RPC from the provider's
//! factories and configured with the data returned by `ConfigureProvider`.
//! Schemas are built once per type and cached. The framework owns the
//! mechanical parts of planning and apply (defaults, unknown computed
//! values, replacement detection, state conforming) so resource
//! implementations only deal with the remote API.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceSchemaRequest, DataSourceWithConfigure,
    ReadDataSourceRequest, ValidateDataSourceConfigRequest,
};
use crate::plan_modifier::{value_changed, values_equal};
use crate::proto;
use crate::provider::{
    ConfigureProviderRequest, DataSourceFactory, Provider, ProviderMetaSchemaRequest,
    ProviderMetadataRequest, ProviderSchemaRequest, ResourceFactory, StopProviderRequest,
    ValidateProviderConfigRequest,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ModifyPlanRequest, ReadResourceRequest, ResourceSchemaRequest,
    ResourceWithConfigure, UpdateResourceRequest, UpgradeResourceStateRequest,
    ValidateResourceConfigRequest,
};
use crate::schema::{
    Attribute, Block, DefaultRequest, NestedBlock, NestingMode, PlanModifierRequest, Schema,
    StringKind, ValidatorRequest,
};
use crate::types::{
    has_errors, AttributePath, AttributePathStep, ClientCapabilities, Deferred, DeferredReason,
    Diagnostic, DiagnosticSeverity, Dynamic, DynamicValue, RawState, ServerCapabilities,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn, Instrument};

type ProviderData = Arc<dyn Any + Send + Sync>;
type RpcResult<T> = std::result::Result<Response<T>, Status>;

pub struct GrpcProviderServer {
    provider: RwLock<Box<dyn Provider>>,
    provider_data: RwLock<Option<ProviderData>>,
    resources: HashMap<String, ResourceFactory>,
    data_sources: HashMap<String, DataSourceFactory>,
    resource_schemas: RwLock<HashMap<String, Arc<Schema>>>,
    data_source_schemas: RwLock<HashMap<String, Arc<Schema>>>,
    root: Context,
}

impl GrpcProviderServer {
    pub fn new<P: Provider + 'static>(provider: P) -> Self {
        let resources = provider.resources();
        let data_sources = provider.data_sources();
        Self {
            provider: RwLock::new(Box::new(provider)),
            provider_data: RwLock::new(None),
            resources,
            data_sources,
            resource_schemas: RwLock::new(HashMap::new()),
            data_source_schemas: RwLock::new(HashMap::new()),
            root: Context::new(),
        }
    }

    /// Root of every request context; cancelling it cancels in-flight RPCs.
    pub fn root_context(&self) -> Context {
        self.root.clone()
    }

    fn request_context(&self, rpc: &'static str, type_name: &str) -> (Context, tracing::Span) {
        let ctx = self.root.child();
        let span = tracing::info_span!("rpc", rpc, type_name, log_id = %ctx.log_id());
        (ctx, span)
    }

    async fn resource_schema(&self, ctx: &Context, type_name: &str) -> Result<Arc<Schema>, Status> {
        if let Some(schema) = self.resource_schemas.read().await.get(type_name) {
            return Ok(schema.clone());
        }
        let factory = self
            .resources
            .get(type_name)
            .ok_or_else(|| Status::not_found(format!("Unknown resource type: {}", type_name)))?;
        let response = factory().schema(ctx.clone(), ResourceSchemaRequest).await;
        if has_errors(&response.diagnostics) {
            return Err(Status::internal(format!(
                "Failed to build schema for {}: {}",
                type_name,
                summarize(&response.diagnostics)
            )));
        }
        let schema = Arc::new(response.schema);
        self.resource_schemas
            .write()
            .await
            .insert(type_name.to_string(), schema.clone());
        Ok(schema)
    }

    async fn data_source_schema(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<Arc<Schema>, Status> {
        if let Some(schema) = self.data_source_schemas.read().await.get(type_name) {
            return Ok(schema.clone());
        }
        let factory = self.data_sources.get(type_name).ok_or_else(|| {
            Status::not_found(format!("Unknown data source type: {}", type_name))
        })?;
        let response = factory().schema(ctx.clone(), DataSourceSchemaRequest).await;
        if has_errors(&response.diagnostics) {
            return Err(Status::internal(format!(
                "Failed to build schema for {}: {}",
                type_name,
                summarize(&response.diagnostics)
            )));
        }
        let schema = Arc::new(response.schema);
        self.data_source_schemas
            .write()
            .await
            .insert(type_name.to_string(), schema.clone());
        Ok(schema)
    }

    /// A fresh resource instance that has received the provider data.
    async fn configured_resource(
        &self,
        ctx: &Context,
        type_name: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Box<dyn ResourceWithConfigure>, Status> {
        let factory = self
            .resources
            .get(type_name)
            .ok_or_else(|| Status::not_found(format!("Unknown resource type: {}", type_name)))?;
        let mut resource = factory();
        let provider_data = self.provider_data.read().await.clone();
        let response = resource
            .configure(ctx.clone(), ConfigureResourceRequest { provider_data })
            .await;
        diagnostics.extend(response.diagnostics);
        Ok(resource)
    }

    async fn configured_data_source(
        &self,
        ctx: &Context,
        type_name: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Box<dyn DataSourceWithConfigure>, Status> {
        let factory = self.data_sources.get(type_name).ok_or_else(|| {
            Status::not_found(format!("Unknown data source type: {}", type_name))
        })?;
        let mut data_source = factory();
        let provider_data = self.provider_data.read().await.clone();
        let response = data_source
            .configure(ctx.clone(), ConfigureDataSourceRequest { provider_data })
            .await;
        diagnostics.extend(response.diagnostics);
        Ok(data_source)
    }
}

#[tonic::async_trait]
impl proto::ProviderService for GrpcProviderServer {
    async fn get_metadata(
        &self,
        _request: Request<proto::get_metadata::Request>,
    ) -> RpcResult<proto::get_metadata::Response> {
        let (ctx, span) = self.request_context("GetMetadata", "");
        let provider = self.provider.read().await;
        let metadata = provider
            .metadata(ctx, ProviderMetadataRequest)
            .instrument(span)
            .await;

        let mut resources: Vec<_> = self.resources.keys().cloned().collect();
        resources.sort();
        let mut data_sources: Vec<_> = self.data_sources.keys().cloned().collect();
        data_sources.sort();

        Ok(Response::new(proto::get_metadata::Response {
            server_capabilities: Some(capabilities_to_proto(&metadata.server_capabilities)),
            diagnostics: vec![],
            data_sources: data_sources
                .into_iter()
                .map(|type_name| proto::get_metadata::DataSourceMetadata { type_name })
                .collect(),
            resources: resources
                .into_iter()
                .map(|type_name| proto::get_metadata::ResourceMetadata { type_name })
                .collect(),
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<proto::get_provider_schema::Request>,
    ) -> RpcResult<proto::get_provider_schema::Response> {
        let (ctx, span) = self.request_context("GetProviderSchema", "");

        let (provider_schema, meta_schema, metadata) = {
            let provider = self.provider.read().await;
            (
                provider.schema(ctx.clone(), ProviderSchemaRequest).await,
                provider
                    .meta_schema(ctx.clone(), ProviderMetaSchemaRequest)
                    .await,
                provider.metadata(ctx.clone(), ProviderMetadataRequest).await,
            )
        };

        let mut diagnostics = provider_schema.diagnostics;
        diagnostics.extend(meta_schema.diagnostics);

        let mut resource_schemas = HashMap::new();
        for type_name in self.resources.keys() {
            let schema = self.resource_schema(&ctx, type_name).await?;
            resource_schemas.insert(type_name.clone(), schema_to_proto(&schema));
        }

        let mut data_source_schemas = HashMap::new();
        for type_name in self.data_sources.keys() {
            let schema = self.data_source_schema(&ctx, type_name).await?;
            data_source_schemas.insert(type_name.clone(), schema_to_proto(&schema));
        }

        span.in_scope(|| {
            debug!(
                resources = resource_schemas.len(),
                data_sources = data_source_schemas.len(),
                "served provider schema"
            )
        });

        Ok(Response::new(proto::get_provider_schema::Response {
            provider: Some(schema_to_proto(&provider_schema.schema)),
            resource_schemas,
            data_source_schemas,
            diagnostics: diagnostics_to_proto(diagnostics),
            provider_meta: meta_schema.schema.as_ref().map(schema_to_proto),
            server_capabilities: Some(capabilities_to_proto(&metadata.server_capabilities)),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<proto::validate_provider_config::Request>,
    ) -> RpcResult<proto::validate_provider_config::Response> {
        let req = request.into_inner();
        let (ctx, span) = self.request_context("ValidateProviderConfig", "");
        let config = decode_value(req.config.as_ref())?;

        let provider = self.provider.read().await;
        let schema = provider.schema(ctx.clone(), ProviderSchemaRequest).await;
        let mut diagnostics = schema.diagnostics;
        validate_block(
            &schema.schema.block,
            &config.value,
            &AttributePath::root(),
            &mut diagnostics,
        );
        let response = provider
            .validate(ctx, ValidateProviderConfigRequest { config })
            .instrument(span)
            .await;
        diagnostics.extend(response.diagnostics);

        Ok(Response::new(proto::validate_provider_config::Response {
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<proto::validate_resource_config::Request>,
    ) -> RpcResult<proto::validate_resource_config::Response> {
        let req = request.into_inner();
        let (ctx, span) = self.request_context("ValidateResourceConfig", &req.type_name);
        let schema = self.resource_schema(&ctx, &req.type_name).await?;
        let config = decode_value(req.config.as_ref())?;

        let mut diagnostics = Vec::new();
        validate_block(
            &schema.block,
            &config.value,
            &AttributePath::root(),
            &mut diagnostics,
        );

        // Validation runs before ConfigureProvider, so the instance is not configured
        let factory = self.resources.get(&req.type_name).ok_or_else(|| {
            Status::not_found(format!("Unknown resource type: {}", req.type_name))
        })?;
        let response = factory()
            .validate(
                ctx,
                ValidateResourceConfigRequest {
                    type_name: req.type_name.clone(),
                    config,
                    client_capabilities: client_capabilities_from_proto(
                        req.client_capabilities.as_ref(),
                    ),
                },
            )
            .instrument(span)
            .await;
        diagnostics.extend(response.diagnostics);

        Ok(Response::new(proto::validate_resource_config::Response {
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<proto::validate_data_resource_config::Request>,
    ) -> RpcResult<proto::validate_data_resource_config::Response> {
        let req = request.into_inner();
        let (ctx, span) = self.request_context("ValidateDataResourceConfig", &req.type_name);
        let schema = self.data_source_schema(&ctx, &req.type_name).await?;
        let config = decode_value(req.config.as_ref())?;

        let mut diagnostics = Vec::new();
        validate_block(
            &schema.block,
            &config.value,
            &AttributePath::root(),
            &mut diagnostics,
        );

        let factory = self.data_sources.get(&req.type_name).ok_or_else(|| {
            Status::not_found(format!("Unknown data source type: {}", req.type_name))
        })?;
        let response = factory()
            .validate(
                ctx,
                ValidateDataSourceConfigRequest {
                    type_name: req.type_name.clone(),
                    config,
                },
            )
            .instrument(span)
            .await;
        diagnostics.extend(response.diagnostics);

        Ok(Response::new(proto::validate_data_resource_config::Response {
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<proto::upgrade_resource_state::Request>,
    ) -> RpcResult<proto::upgrade_resource_state::Response> {
        let req = request.into_inner();
        let (ctx, span) = self.request_context("UpgradeResourceState", &req.type_name);
        let schema = self.resource_schema(&ctx, &req.type_name).await?;
        let raw = req.raw_state.unwrap_or_default();
        let raw_state = RawState {
            json: (!raw.json.is_empty()).then_some(raw.json),
            flatmap: (!raw.flatmap.is_empty()).then_some(raw.flatmap),
        };

        let mut diagnostics = Vec::new();

        if req.version > schema.version {
            diagnostics.push(Diagnostic::error(
                "Unable to Upgrade Resource State",
                format!(
                    "{} stored state is at schema version {}, newer than this provider's version {}",
                    req.type_name, req.version, schema.version
                ),
            ));
            return Ok(Response::new(proto::upgrade_resource_state::Response {
                upgraded_state: None,
                diagnostics: diagnostics_to_proto(diagnostics),
            }));
        }

        if req.version != schema.version {
            let resource = self
                .configured_resource(&ctx, &req.type_name, &mut diagnostics)
                .await?;
            let Some(upgrader) = resource.as_upgrade_state() else {
                diagnostics.push(Diagnostic::error(
                    "Unable to Upgrade Resource State",
                    format!(
                        "{} stored state is at schema version {} but the provider expects version {} and has no upgrade path",
                        req.type_name, req.version, schema.version
                    ),
                ));
                return Ok(Response::new(proto::upgrade_resource_state::Response {
                    upgraded_state: None,
                    diagnostics: diagnostics_to_proto(diagnostics),
                }));
            };
            let response = upgrader
                .upgrade_state(
                    ctx,
                    UpgradeResourceStateRequest {
                        type_name: req.type_name.clone(),
                        version: req.version,
                        raw_state,
                    },
                )
                .instrument(span)
                .await;
            diagnostics.extend(response.diagnostics);
            let upgraded = schema.conform(&response.upgraded_state);
            return Ok(Response::new(proto::upgrade_resource_state::Response {
                upgraded_state: Some(encode_value(&upgraded)?),
                diagnostics: diagnostics_to_proto(diagnostics),
            }));
        }

        let state = match (&raw_state.json, &raw_state.flatmap) {
            (Some(json), _) => DynamicValue::decode_json(json)
                .map_err(|e| Status::invalid_argument(e.to_string()))?,
            (None, Some(_)) => {
                diagnostics.push(Diagnostic::error(
                    "Unable to Upgrade Resource State",
                    "flatmap state from Terraform 0.11 and earlier is not supported",
                ));
                return Ok(Response::new(proto::upgrade_resource_state::Response {
                    upgraded_state: None,
                    diagnostics: diagnostics_to_proto(diagnostics),
                }));
            }
            (None, None) => DynamicValue::null(),
        };

        Ok(Response::new(proto::upgrade_resource_state::Response {
            upgraded_state: Some(encode_value(&schema.conform(&state))?),
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<proto::configure_provider::Request>,
    ) -> RpcResult<proto::configure_provider::Response> {
        let req = request.into_inner();
        let (ctx, span) = self.request_context("ConfigureProvider", "");
        let config = decode_value(req.config.as_ref())?;

        let response = {
            let mut provider = self.provider.write().await;
            provider
                .configure(
                    ctx,
                    ConfigureProviderRequest {
                        terraform_version: req.terraform_version.clone(),
                        config,
                        client_capabilities: client_capabilities_from_proto(
                            req.client_capabilities.as_ref(),
                        ),
                    },
                )
                .instrument(span)
                .await
        };

        if !has_errors(&response.diagnostics) {
            *self.provider_data.write().await = response.provider_data;
            info!(terraform_version = %req.terraform_version, "provider configured");
        }

        Ok(Response::new(proto::configure_provider::Response {
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn read_resource(
        &self,
        request: Request<proto::read_resource::Request>,
    ) -> RpcResult<proto::read_resource::Response> {
        let req = request.into_inner();
        let (ctx, span) = self.request_context("ReadResource", &req.type_name);
        let schema = self.resource_schema(&ctx, &req.type_name).await?;
        let current_state = decode_value(req.current_state.as_ref())?;

        if current_state.is_null() {
            return Ok(Response::new(proto::read_resource::Response {
                new_state: Some(encode_value(&DynamicValue::null())?),
                diagnostics: vec![],
                private: req.private,
                deferred: None,
            }));
        }

        let mut diagnostics = Vec::new();
        let resource = self
            .configured_resource(&ctx, &req.type_name, &mut diagnostics)
            .await?;
        if has_errors(&diagnostics) {
            return Ok(Response::new(proto::read_resource::Response {
                new_state: req.current_state,
                diagnostics: diagnostics_to_proto(diagnostics),
                private: req.private,
                deferred: None,
            }));
        }

        let started = Instant::now();
        let response = resource
            .read(
                ctx,
                ReadResourceRequest {
                    type_name: req.type_name.clone(),
                    current_state,
                    private: req.private,
                    provider_meta: decode_optional(req.provider_meta.as_ref())?,
                    client_capabilities: client_capabilities_from_proto(
                        req.client_capabilities.as_ref(),
                    ),
                },
            )
            .instrument(span.clone())
            .await;
        diagnostics.extend(response.diagnostics);

        let new_state = match response.new_state {
            Some(state) => schema.conform(&state),
            None => {
                span.in_scope(|| info!("resource no longer exists, removing from state"));
                DynamicValue::null()
            }
        };
        span.in_scope(|| debug!(elapsed_ms = started.elapsed().as_millis() as u64, "read finished"));

        Ok(Response::new(proto::read_resource::Response {
            new_state: Some(encode_value(&new_state)?),
            diagnostics: diagnostics_to_proto(diagnostics),
            private: response.private,
            deferred: response.deferred.as_ref().map(deferred_to_proto),
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<proto::plan_resource_change::Request>,
    ) -> RpcResult<proto::plan_resource_change::Response> {
        let req = request.into_inner();
        let (ctx, span) = self.request_context("PlanResourceChange", &req.type_name);
        let schema = self.resource_schema(&ctx, &req.type_name).await?;

        let prior_state = decode_value(req.prior_state.as_ref())?;
        let proposed = decode_value(req.proposed_new_state.as_ref())?;
        let config = decode_value(req.config.as_ref())?;

        if proposed.is_null() {
            return Ok(Response::new(proto::plan_resource_change::Response {
                planned_state: Some(encode_value(&DynamicValue::null())?),
                requires_replace: vec![],
                planned_private: req.prior_private,
                diagnostics: vec![],
                legacy_type_system: false,
                deferred: None,
            }));
        }

        let is_create = prior_state.is_null();
        let mut diagnostics = Vec::new();
        let mut requires_replace = Vec::new();

        let mut planned = schema.conform(&proposed).value;
        apply_defaults(&schema.block, &config.value, &mut planned, &AttributePath::root());
        let changed = is_create || !values_equal(&prior_state.value, &planned);
        let planner = Planner {
            is_create,
            changed,
            requires_replace: &mut requires_replace,
            diagnostics: &mut diagnostics,
        };
        let planned = planner.plan_block(
            &schema.block,
            &config.value,
            &prior_state.value,
            planned,
            &AttributePath::root(),
        );

        let mut planned_state = DynamicValue::new(planned);
        let mut planned_private = req.prior_private.clone();

        let resource = self
            .configured_resource(&ctx, &req.type_name, &mut diagnostics)
            .await?;
        if let Some(modifier) = resource.as_modify_plan() {
            if !has_errors(&diagnostics) {
                let response = modifier
                    .modify_plan(
                        ctx,
                        ModifyPlanRequest {
                            type_name: req.type_name.clone(),
                            config,
                            prior_state,
                            proposed_new_state: planned_state.clone(),
                            prior_private: req.prior_private,
                            provider_meta: decode_optional(req.provider_meta.as_ref())?,
                        },
                    )
                    .instrument(span.clone())
                    .await;
                planned_state = schema.conform(&response.planned_state);
                planned_private = response.planned_private;
                requires_replace.extend(response.requires_replace);
                diagnostics.extend(response.diagnostics);
            }
        }

        span.in_scope(|| {
            debug!(
                create = is_create,
                changed,
                replace = requires_replace.len(),
                "planned resource change"
            )
        });

        Ok(Response::new(proto::plan_resource_change::Response {
            planned_state: Some(encode_value(&planned_state)?),
            requires_replace: requires_replace.iter().map(path_to_proto).collect(),
            planned_private,
            diagnostics: diagnostics_to_proto(diagnostics),
            legacy_type_system: false,
            deferred: None,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<proto::apply_resource_change::Request>,
    ) -> RpcResult<proto::apply_resource_change::Response> {
        let req = request.into_inner();
        let (ctx, span) = self.request_context("ApplyResourceChange", &req.type_name);
        let schema = self.resource_schema(&ctx, &req.type_name).await?;

        let prior_state = decode_value(req.prior_state.as_ref())?;
        let planned_state = decode_value(req.planned_state.as_ref())?;
        let config = decode_value(req.config.as_ref())?;
        let provider_meta = decode_optional(req.provider_meta.as_ref())?;

        let mut diagnostics = Vec::new();
        let resource = self
            .configured_resource(&ctx, &req.type_name, &mut diagnostics)
            .await?;
        if has_errors(&diagnostics) {
            return Ok(Response::new(proto::apply_resource_change::Response {
                new_state: req.prior_state,
                private: req.planned_private,
                diagnostics: diagnostics_to_proto(diagnostics),
                legacy_type_system: false,
            }));
        }

        let started = Instant::now();
        let (new_state, private) = if planned_state.is_null() {
            let response = resource
                .delete(
                    ctx,
                    DeleteResourceRequest {
                        type_name: req.type_name.clone(),
                        prior_state,
                        planned_private: req.planned_private.clone(),
                        provider_meta,
                    },
                )
                .instrument(span.clone())
                .await;
            diagnostics.extend(response.diagnostics);
            // Terraform keeps the prior state itself when delete reports errors
            (DynamicValue::null(), Vec::new())
        } else if prior_state.is_null() {
            let response = resource
                .create(
                    ctx,
                    CreateResourceRequest {
                        type_name: req.type_name.clone(),
                        planned_state,
                        config,
                        planned_private: req.planned_private.clone(),
                        provider_meta,
                    },
                )
                .instrument(span.clone())
                .await;
            diagnostics.extend(response.diagnostics);
            let new_state = if has_errors(&diagnostics) {
                // Partial state is only useful when it is fully known
                if response.new_state.contains_unknown() {
                    DynamicValue::null()
                } else {
                    response.new_state
                }
            } else {
                response.new_state
            };
            (new_state, response.private)
        } else {
            let response = resource
                .update(
                    ctx,
                    UpdateResourceRequest {
                        type_name: req.type_name.clone(),
                        prior_state: prior_state.clone(),
                        planned_state,
                        config,
                        planned_private: req.planned_private.clone(),
                        provider_meta,
                    },
                )
                .instrument(span.clone())
                .await;
            diagnostics.extend(response.diagnostics);
            if has_errors(&diagnostics) {
                (prior_state, req.planned_private)
            } else {
                (response.new_state, response.private)
            }
        };

        let mut new_state = schema.conform(&new_state);
        if new_state.value.unknowns_to_null() {
            span.in_scope(|| warn!("apply left unknown values in state, storing them as null"));
        }
        span.in_scope(|| {
            debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                failed = has_errors(&diagnostics),
                "apply finished"
            )
        });

        Ok(Response::new(proto::apply_resource_change::Response {
            new_state: Some(encode_value(&new_state)?),
            private,
            diagnostics: diagnostics_to_proto(diagnostics),
            legacy_type_system: false,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<proto::import_resource_state::Request>,
    ) -> RpcResult<proto::import_resource_state::Response> {
        let req = request.into_inner();
        let (ctx, span) = self.request_context("ImportResourceState", &req.type_name);
        let schema = self.resource_schema(&ctx, &req.type_name).await?;

        let mut diagnostics = Vec::new();
        let resource = self
            .configured_resource(&ctx, &req.type_name, &mut diagnostics)
            .await?;

        let Some(importer) = resource.as_import_state() else {
            diagnostics.push(Diagnostic::error(
                "Import Not Implemented",
                format!("{} does not support terraform import", req.type_name),
            ));
            return Ok(Response::new(proto::import_resource_state::Response {
                imported_resources: vec![],
                diagnostics: diagnostics_to_proto(diagnostics),
                deferred: None,
            }));
        };

        let response = importer
            .import_state(
                ctx,
                ImportResourceStateRequest {
                    type_name: req.type_name.clone(),
                    id: req.id.clone(),
                    client_capabilities: client_capabilities_from_proto(
                        req.client_capabilities.as_ref(),
                    ),
                },
            )
            .instrument(span)
            .await;
        diagnostics.extend(response.diagnostics);

        let mut imported_resources = Vec::with_capacity(response.imported_resources.len());
        for imported in response.imported_resources {
            imported_resources.push(proto::import_resource_state::ImportedResource {
                type_name: imported.type_name,
                state: Some(encode_value(&schema.conform(&imported.state))?),
                private: imported.private,
            });
        }

        Ok(Response::new(proto::import_resource_state::Response {
            imported_resources,
            diagnostics: diagnostics_to_proto(diagnostics),
            deferred: response.deferred.as_ref().map(deferred_to_proto),
        }))
    }

    async fn read_data_source(
        &self,
        request: Request<proto::read_data_source::Request>,
    ) -> RpcResult<proto::read_data_source::Response> {
        let req = request.into_inner();
        let (ctx, span) = self.request_context("ReadDataSource", &req.type_name);
        let schema = self.data_source_schema(&ctx, &req.type_name).await?;
        let config = decode_value(req.config.as_ref())?;

        let mut diagnostics = Vec::new();
        let data_source = self
            .configured_data_source(&ctx, &req.type_name, &mut diagnostics)
            .await?;
        if has_errors(&diagnostics) {
            return Ok(Response::new(proto::read_data_source::Response {
                state: None,
                diagnostics: diagnostics_to_proto(diagnostics),
                deferred: None,
            }));
        }

        let started = Instant::now();
        let response = data_source
            .read(
                ctx,
                ReadDataSourceRequest {
                    type_name: req.type_name.clone(),
                    config,
                    provider_meta: decode_optional(req.provider_meta.as_ref())?,
                    client_capabilities: client_capabilities_from_proto(
                        req.client_capabilities.as_ref(),
                    ),
                },
            )
            .instrument(span.clone())
            .await;
        diagnostics.extend(response.diagnostics);

        let mut state = schema.conform(&response.state);
        state.value.unknowns_to_null();
        span.in_scope(|| debug!(elapsed_ms = started.elapsed().as_millis() as u64, "data source read"));

        Ok(Response::new(proto::read_data_source::Response {
            state: Some(encode_value(&state)?),
            diagnostics: diagnostics_to_proto(diagnostics),
            deferred: response.deferred.as_ref().map(deferred_to_proto),
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<proto::stop_provider::Request>,
    ) -> RpcResult<proto::stop_provider::Response> {
        let (ctx, span) = self.request_context("StopProvider", "");
        let response = {
            let provider = self.provider.read().await;
            provider
                .stop(ctx, StopProviderRequest)
                .instrument(span)
                .await
        };
        self.root.cancel();
        info!("provider stop requested, cancelling in-flight operations");

        Ok(Response::new(proto::stop_provider::Response {
            error: response.error.unwrap_or_default(),
        }))
    }
}

/// Fills optional+computed attributes that have a default and no
/// configured value.
fn apply_defaults(block: &Block, config: &Dynamic, planned: &mut Dynamic, path: &AttributePath) {
    let Dynamic::Map(planned_map) = planned else {
        return;
    };

    for attr in &block.attributes {
        let Some(default) = &attr.default else {
            continue;
        };
        if !config.get(&attr.name).unwrap_or(&Dynamic::Null).is_null() {
            continue;
        }
        let response = default.default_value(DefaultRequest {
            path: path.clone().attribute(&attr.name),
        });
        planned_map.insert(attr.name.clone(), response.value.value);
    }

    for nested in &block.block_types {
        let child_config = config.get(&nested.type_name).unwrap_or(&Dynamic::Null);
        let Some(child_planned) = planned_map.get_mut(&nested.type_name) else {
            continue;
        };
        let child_path = path.clone().attribute(&nested.type_name);
        match child_planned {
            Dynamic::List(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    let item_config = child_config
                        .as_list()
                        .and_then(|l| l.get(i))
                        .unwrap_or(&Dynamic::Null);
                    apply_defaults(
                        &nested.block,
                        item_config,
                        item,
                        &child_path.clone().index(i as i64),
                    );
                }
            }
            Dynamic::Map(_) if matches!(nested.nesting, NestingMode::Single | NestingMode::Group) => {
                apply_defaults(&nested.block, child_config, child_planned, &child_path);
            }
            _ => {}
        }
    }
}

/// Marks computed values unknown and runs plan modifiers, walking nested
/// blocks alongside the matching config and prior elements.
struct Planner<'a> {
    is_create: bool,
    changed: bool,
    requires_replace: &'a mut Vec<AttributePath>,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Planner<'_> {
    fn plan_block(
        mut self,
        block: &Block,
        config: &Dynamic,
        prior: &Dynamic,
        planned: Dynamic,
        path: &AttributePath,
    ) -> Dynamic {
        self.plan_block_inner(block, config, prior, planned, path)
    }

    fn plan_block_inner(
        &mut self,
        block: &Block,
        config: &Dynamic,
        prior: &Dynamic,
        planned: Dynamic,
        path: &AttributePath,
    ) -> Dynamic {
        let Dynamic::Map(mut planned_map) = planned else {
            return planned;
        };

        for attr in &block.attributes {
            let attr_path = path.clone().attribute(&attr.name);
            let config_value = config.get(&attr.name).cloned().unwrap_or(Dynamic::Null);
            let prior_value = prior.get(&attr.name).cloned().unwrap_or(Dynamic::Null);
            let mut value = planned_map.remove(&attr.name).unwrap_or(Dynamic::Null);

            if config_value.is_null() && attr.computed && attr.default.is_none() {
                if self.is_create && value.is_null() {
                    value = Dynamic::Unknown;
                } else if !self.is_create && self.changed {
                    value = Dynamic::Unknown;
                }
            }

            if !self.is_create {
                value = self.run_plan_modifiers(attr, config_value, prior_value, value, &attr_path);
            }
            planned_map.insert(attr.name.clone(), value);
        }

        for nested in &block.block_types {
            let nested_path = path.clone().attribute(&nested.type_name);
            let config_value = config.get(&nested.type_name).unwrap_or(&Dynamic::Null);
            let prior_value = prior.get(&nested.type_name).unwrap_or(&Dynamic::Null);
            let value = planned_map
                .remove(&nested.type_name)
                .unwrap_or(Dynamic::Null);
            let value = self.plan_nested(nested, config_value, prior_value, value, &nested_path);

            if !self.is_create && nested.requires_replace && value_changed(prior_value, &value) {
                self.requires_replace.push(nested_path);
            }
            planned_map.insert(nested.type_name.clone(), value);
        }

        Dynamic::Map(planned_map)
    }

    fn plan_nested(
        &mut self,
        nested: &NestedBlock,
        config: &Dynamic,
        prior: &Dynamic,
        planned: Dynamic,
        path: &AttributePath,
    ) -> Dynamic {
        match planned {
            Dynamic::List(items) => Dynamic::List(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let item_config = element(config, i);
                        let item_prior = element(prior, i);
                        self.plan_block_inner(
                            &nested.block,
                            item_config,
                            item_prior,
                            item,
                            &path.clone().index(i as i64),
                        )
                    })
                    .collect(),
            ),
            Dynamic::Map(map) if nested.nesting == NestingMode::Map => Dynamic::Map(
                map.into_iter()
                    .map(|(key, item)| {
                        let item_config = config.get(&key).unwrap_or(&Dynamic::Null);
                        let item_prior = prior.get(&key).unwrap_or(&Dynamic::Null);
                        let item_path = path.clone().key(&key);
                        let item =
                            self.plan_block_inner(&nested.block, item_config, item_prior, item, &item_path);
                        (key, item)
                    })
                    .collect(),
            ),
            value @ Dynamic::Map(_) => {
                self.plan_block_inner(&nested.block, config, prior, value, path)
            }
            other => other,
        }
    }

    fn run_plan_modifiers(
        &mut self,
        attr: &Attribute,
        config_value: Dynamic,
        prior_value: Dynamic,
        mut value: Dynamic,
        path: &AttributePath,
    ) -> Dynamic {
        for modifier in &attr.plan_modifiers {
            let response = modifier.modify(PlanModifierRequest {
                config_value: DynamicValue::new(config_value.clone()),
                state_value: DynamicValue::new(prior_value.clone()),
                plan_value: DynamicValue::new(value),
                path: path.clone(),
            });
            value = response.plan_value.value;
            if response.requires_replace && !self.requires_replace.contains(path) {
                self.requires_replace.push(path.clone());
            }
            self.diagnostics.extend(response.diagnostics);
        }
        value
    }
}

fn element(value: &Dynamic, index: usize) -> &Dynamic {
    value
        .as_list()
        .and_then(|l| l.get(index))
        .unwrap_or(&Dynamic::Null)
}

/// Runs attribute validators on known, non-null configured values.
fn validate_block(
    block: &Block,
    config: &Dynamic,
    path: &AttributePath,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Dynamic::Map(config_map) = config else {
        return;
    };

    for attr in &block.attributes {
        let Some(value) = config_map.get(&attr.name) else {
            continue;
        };
        if value.is_null() || value.contains_unknown() {
            continue;
        }
        let attr_path = path.clone().attribute(&attr.name);
        for validator in &attr.validators {
            let response = validator.validate(ValidatorRequest {
                config_value: DynamicValue::new(value.clone()),
                path: attr_path.clone(),
            });
            diagnostics.extend(response.diagnostics);
        }
    }

    for nested in &block.block_types {
        let nested_path = path.clone().attribute(&nested.type_name);
        match config_map.get(&nested.type_name) {
            Some(Dynamic::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    validate_block(
                        &nested.block,
                        item,
                        &nested_path.clone().index(i as i64),
                        diagnostics,
                    );
                }
            }
            Some(Dynamic::Map(map)) if nested.nesting == NestingMode::Map => {
                for (key, item) in map {
                    validate_block(&nested.block, item, &nested_path.clone().key(key), diagnostics);
                }
            }
            Some(value @ Dynamic::Map(_)) => {
                validate_block(&nested.block, value, &nested_path, diagnostics)
            }
            _ => {}
        }
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.summary.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn decode_value(value: Option<&proto::DynamicValue>) -> Result<DynamicValue, Status> {
    let Some(value) = value else {
        return Ok(DynamicValue::null());
    };
    let decoded = if !value.msgpack.is_empty() {
        DynamicValue::decode_msgpack(&value.msgpack)
    } else {
        DynamicValue::decode_json(&value.json)
    };
    decoded.map_err(|e| Status::invalid_argument(e.to_string()))
}

fn decode_optional(value: Option<&proto::DynamicValue>) -> Result<Option<DynamicValue>, Status> {
    match value {
        Some(v) => decode_value(Some(v)).map(|d| (!d.is_null()).then_some(d)),
        None => Ok(None),
    }
}

fn encode_value(value: &DynamicValue) -> Result<proto::DynamicValue, Status> {
    let msgpack = value
        .encode_msgpack()
        .map_err(|e| Status::internal(e.to_string()))?;
    Ok(proto::DynamicValue {
        msgpack,
        json: vec![],
    })
}

pub(crate) fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<proto::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| proto::Diagnostic {
            severity: match d.severity {
                DiagnosticSeverity::Invalid => proto::diagnostic::Severity::Invalid,
                DiagnosticSeverity::Error => proto::diagnostic::Severity::Error,
                DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning,
            } as i32,
            summary: d.summary,
            detail: d.detail,
            attribute: d.attribute.as_ref().map(path_to_proto),
        })
        .collect()
}

fn path_to_proto(path: &AttributePath) -> proto::AttributePath {
    use proto::attribute_path::step::Selector;

    proto::AttributePath {
        steps: path
            .steps
            .iter()
            .map(|step| proto::attribute_path::Step {
                selector: Some(match step {
                    AttributePathStep::AttributeName(name) => Selector::AttributeName(name.clone()),
                    AttributePathStep::ElementKeyString(key) => {
                        Selector::ElementKeyString(key.clone())
                    }
                    AttributePathStep::ElementKeyInt(idx) => Selector::ElementKeyInt(*idx),
                }),
            })
            .collect(),
    }
}

fn capabilities_to_proto(caps: &ServerCapabilities) -> proto::ServerCapabilities {
    proto::ServerCapabilities {
        plan_destroy: caps.plan_destroy,
        get_provider_schema_optional: caps.get_provider_schema_optional,
        move_resource_state: caps.move_resource_state,
    }
}

fn client_capabilities_from_proto(caps: Option<&proto::ClientCapabilities>) -> ClientCapabilities {
    caps.map(|c| ClientCapabilities {
        deferral_allowed: c.deferral_allowed,
        write_only_attributes_allowed: c.write_only_attributes_allowed,
    })
    .unwrap_or_default()
}

fn deferred_to_proto(deferred: &Deferred) -> proto::Deferred {
    use proto::deferred::Reason;

    let reason = match deferred.reason {
        DeferredReason::Unknown => Reason::Unknown,
        DeferredReason::ResourceConfigUnknown => Reason::ResourceConfigUnknown,
        DeferredReason::ProviderConfigUnknown => Reason::ProviderConfigUnknown,
        DeferredReason::AbsentPrereq => Reason::AbsentPrereq,
    };
    proto::Deferred {
        reason: reason as i32,
    }
}

fn string_kind_to_proto(kind: StringKind) -> i32 {
    match kind {
        StringKind::Plain => proto::StringKind::Plain as i32,
        StringKind::Markdown => proto::StringKind::Markdown as i32,
    }
}

pub(crate) fn schema_to_proto(schema: &Schema) -> proto::Schema {
    proto::Schema {
        version: schema.version,
        block: Some(block_to_proto(&schema.block)),
    }
}

fn block_to_proto(block: &Block) -> proto::schema::Block {
    proto::schema::Block {
        version: block.version,
        attributes: block.attributes.iter().map(attribute_to_proto).collect(),
        block_types: block.block_types.iter().map(nested_block_to_proto).collect(),
        description: block.description.clone(),
        description_kind: string_kind_to_proto(block.description_kind),
        deprecated: block.deprecated,
    }
}

fn attribute_to_proto(attr: &Attribute) -> proto::schema::Attribute {
    proto::schema::Attribute {
        name: attr.name.clone(),
        r#type: attr.r#type.encode(),
        nested_type: None,
        description: attr.description.clone(),
        required: attr.required,
        optional: attr.optional,
        computed: attr.computed,
        sensitive: attr.sensitive,
        description_kind: proto::StringKind::Plain as i32,
        deprecated: attr.deprecated,
        write_only: false,
    }
}

fn nested_block_to_proto(nested: &NestedBlock) -> proto::schema::NestedBlock {
    use proto::schema::nested_block::NestingMode as ProtoNesting;

    let nesting = match nested.nesting {
        NestingMode::Invalid => ProtoNesting::Invalid,
        NestingMode::Single => ProtoNesting::Single,
        NestingMode::List => ProtoNesting::List,
        NestingMode::Set => ProtoNesting::Set,
        NestingMode::Map => ProtoNesting::Map,
        NestingMode::Group => ProtoNesting::Group,
    };
    proto::schema::NestedBlock {
        type_name: nested.type_name.clone(),
        block: Some(block_to_proto(&nested.block)),
        nesting: nesting as i32,
        min_items: nested.min_items,
        max_items: nested.max_items,
    }
}

#[cfg(test)]
#[path = "./grpc_test.rs"]
mod grpc_test;
