#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::api::test_helpers::{create_test_client, error_body, response_body};
    use crate::TencentCloudProviderData;
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use tfplug::resource::ResourceSchemaRequest;
    use tfplug::types::ClientCapabilities;

    fn configured(server_url: &str) -> MariadbInstanceResource {
        MariadbInstanceResource {
            provider_data: Some(TencentCloudProviderData {
                client: Arc::new(create_test_client(server_url)),
            }),
        }
    }

    fn object(fields: Vec<(&str, Dynamic)>) -> DynamicValue {
        DynamicValue::new(Dynamic::Map(
            fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        ))
    }

    fn config() -> DynamicValue {
        object(vec![
            ("zones", Dynamic::string_list(["ap-guangzhou-3"])),
            ("node_count", Dynamic::Number(2.0)),
            ("memory", Dynamic::Number(2.0)),
            ("storage", Dynamic::Number(10.0)),
            ("instance_name", Dynamic::from("orders")),
            ("vpc_id", Dynamic::from("vpc-1")),
            ("subnet_id", Dynamic::from("subnet-1")),
            ("tags", Dynamic::string_map([("env", "prod")])),
            (
                "init_params",
                Dynamic::List(vec![object(vec![
                    ("param", Dynamic::from("character_set_server")),
                    ("value", Dynamic::from("utf8mb4")),
                ])
                .value]),
            ),
        ])
    }

    fn instance_body(status: i64, name: &str) -> String {
        response_body(serde_json::json!({
            "TotalCount": 1,
            "Instances": [{
                "InstanceId": "tdsql-1",
                "InstanceName": name,
                "Region": "ap-guangzhou",
                "Zone": "ap-guangzhou-3",
                "Status": status,
                "Vip": "10.0.0.8",
                "Vport": 3306,
                "UniqueVpcId": "vpc-1",
                "UniqueSubnetId": "subnet-1",
                "Memory": 2,
                "Storage": 10,
                "NodeCount": 2,
                "ProjectId": 0,
                "DbVersionId": "10.1.9",
                "AutoRenewFlag": 0,
                "Ipv6Flag": 0
            }]
        }))
    }

    fn tags_body() -> String {
        response_body(serde_json::json!({
            "TotalCount": 1,
            "Tags": [{"TagKey": "env", "TagValue": "prod", "ResourceId": "tdsql-1"}]
        }))
    }

    #[test]
    fn test_resource_type_name() {
        let resource = MariadbInstanceResource::new();
        assert_eq!(resource.type_name(), "tencentcloud_mariadb_instance");
    }

    #[tokio::test]
    async fn test_resource_schema() {
        let resource = MariadbInstanceResource::new();
        let response = resource.schema(Context::new(), ResourceSchemaRequest).await;

        assert!(response.diagnostics.is_empty());
        let block = &response.schema.block;
        for name in ["zones", "node_count", "memory", "storage"] {
            assert!(block.attribute(name).unwrap().required, "{} should be required", name);
        }
        let name = block.attribute("instance_name").unwrap();
        assert!(name.optional && name.computed);
        assert!(block.attribute("vip").unwrap().computed);
        assert!(block.attribute("dcn_instance_id").unwrap().plan_modifiers.len() == 1);
        assert!(block.nested_block("init_params").unwrap().requires_replace);
    }

    #[test]
    fn test_build_create_request() {
        let request = build_create_request(&config()).unwrap();
        assert_eq!(request.zones, vec!["ap-guangzhou-3"]);
        assert_eq!(request.node_count, 2);
        assert_eq!(request.count, Some(1));
        assert_eq!(request.vpc_id.as_deref(), Some("vpc-1"));
        assert_eq!(
            request.resource_tags,
            Some(vec![Tag {
                tag_key: "env".to_string(),
                tag_value: "prod".to_string(),
            }])
        );
        let params = request.init_params.unwrap();
        assert_eq!(params[0].param, "character_set_server");
        assert!(request.voucher_ids.is_none());
    }

    #[test]
    fn test_build_create_request_requires_memory() {
        let mut config = config();
        config.set_null(&AttributePath::new("memory")).unwrap();
        let err = build_create_request(&config).unwrap_err();
        assert_eq!(err.summary, "Missing memory");
    }

    #[tokio::test]
    async fn test_create_waits_tags_and_reads() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/")
            .match_header("x-tc-action", "CreateDBInstance")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "Zones": ["ap-guangzhou-3"],
                "NodeCount": 2,
                "Memory": 2,
                "Storage": 10,
                "Count": 1,
                "InstanceName": "orders",
                "ResourceTags": [{"TagKey": "env", "TagValue": "prod"}]
            })))
            .with_body(response_body(serde_json::json!({
                "DealName": "deal-1",
                "InstanceIds": ["tdsql-1"]
            })))
            .create_async()
            .await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeDBInstances")
            .with_body(instance_body(2, "orders"))
            .create_async()
            .await;
        let tag = server
            .mock("POST", "/")
            .match_header("x-tc-action", "ModifyResourceTags")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "Resource": "qcs::mariadb:ap-guangzhou:uin/:instance/tdsql-1",
                "ReplaceTags": [{"TagKey": "env", "TagValue": "prod"}]
            })))
            .with_body(response_body(serde_json::json!({})))
            .create_async()
            .await;
        let _tags = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeResourceTagsByResourceIds")
            .with_body(tags_body())
            .create_async()
            .await;

        let resource = configured(&server.url());
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "tencentcloud_mariadb_instance".to_string(),
                    planned_state: config(),
                    config: config(),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = response.new_state;
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "tdsql-1");
        assert_eq!(state.get_string(&AttributePath::new("vip")).unwrap(), "10.0.0.8");
        assert_eq!(state.get_i64(&AttributePath::new("vport")).unwrap(), 3306);
        assert_eq!(state.get_i64(&AttributePath::new("status")).unwrap(), 2);
        assert_eq!(
            state.get_string(&AttributePath::new("tags").key("env")).unwrap(),
            "prod"
        );
        create.assert_async().await;
        tag.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_api_error_keeps_planned_state() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "CreateDBInstance")
            .with_body(error_body("InvalidParameter.Zone", "zone not supported"))
            .create_async()
            .await;

        let resource = configured(&server.url());
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "tencentcloud_mariadb_instance".to_string(),
                    planned_state: config(),
                    config: config(),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Failed to create MariaDB instance");
        assert!(response.diagnostics[0].detail.contains("InvalidParameter.Zone"));
    }

    #[tokio::test]
    async fn test_read_removes_missing_instance() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeDBInstances")
            .with_body(response_body(serde_json::json!({"TotalCount": 0, "Instances": []})))
            .create_async()
            .await;

        let resource = configured(&server.url());
        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "tencentcloud_mariadb_instance".to_string(),
                    current_state: object(vec![("id", Dynamic::from("tdsql-1"))]),
                    private: vec![],
                    provider_meta: None,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert!(response.new_state.is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_immutable_change() {
        let resource = configured("http://127.0.0.1:1");
        let mut prior = config();
        prior.set_string(&AttributePath::new("id"), "tdsql-1").unwrap();
        let mut planned = prior.clone();
        planned.set_number(&AttributePath::new("memory"), 4.0).unwrap();

        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "tencentcloud_mariadb_instance".to_string(),
                    prior_state: prior.clone(),
                    planned_state: planned.clone(),
                    config: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "argument `memory` cannot be changed");
        assert_eq!(response.new_state, prior);
    }

    #[tokio::test]
    async fn test_update_renames_and_retags() {
        let mut server = Server::new_async().await;
        let rename = server
            .mock("POST", "/")
            .match_header("x-tc-action", "ModifyDBInstanceName")
            .match_body(Matcher::Json(serde_json::json!({
                "InstanceId": "tdsql-1",
                "InstanceName": "orders-v2"
            })))
            .with_body(response_body(serde_json::json!({})))
            .create_async()
            .await;
        let retag = server
            .mock("POST", "/")
            .match_header("x-tc-action", "ModifyResourceTags")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "ReplaceTags": [{"TagKey": "env", "TagValue": "staging"}]
            })))
            .with_body(response_body(serde_json::json!({})))
            .create_async()
            .await;
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeDBInstances")
            .with_body(instance_body(2, "orders-v2"))
            .create_async()
            .await;
        let _tags = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeResourceTagsByResourceIds")
            .with_body(response_body(serde_json::json!({
                "TotalCount": 1,
                "Tags": [{"TagKey": "env", "TagValue": "staging", "ResourceId": "tdsql-1"}]
            })))
            .create_async()
            .await;

        let mut prior = config();
        prior.set_string(&AttributePath::new("id"), "tdsql-1").unwrap();
        let mut planned = prior.clone();
        planned
            .set_string(&AttributePath::new("instance_name"), "orders-v2")
            .unwrap();
        planned
            .set_value(&AttributePath::new("tags"), Dynamic::string_map([("env", "staging")]))
            .unwrap();

        let resource = configured(&server.url());
        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "tencentcloud_mariadb_instance".to_string(),
                    prior_state: prior,
                    planned_state: planned.clone(),
                    config: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            response
                .new_state
                .get_string(&AttributePath::new("instance_name"))
                .unwrap(),
            "orders-v2"
        );
        rename.assert_async().await;
        retag.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_isolates_then_destroys() {
        let mut server = Server::new_async().await;
        let isolate = server
            .mock("POST", "/")
            .match_header("x-tc-action", "IsolateDBInstance")
            .match_body(Matcher::Json(serde_json::json!({"InstanceIds": ["tdsql-1"]})))
            .with_body(response_body(serde_json::json!({
                "SuccessInstanceIds": ["tdsql-1"],
                "FailedInstanceIds": []
            })))
            .create_async()
            .await;
        let destroy = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DestroyDBInstance")
            .with_body(response_body(serde_json::json!({"InstanceId": "tdsql-1", "FlowId": 9})))
            .create_async()
            .await;
        // Gone by the time anyone looks
        let _describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeDBInstances")
            .with_body(response_body(serde_json::json!({"TotalCount": 0, "Instances": []})))
            .create_async()
            .await;

        let resource = configured(&server.url());
        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "tencentcloud_mariadb_instance".to_string(),
                    prior_state: object(vec![("id", Dynamic::from("tdsql-1"))]),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        isolate.assert_async().await;
        destroy.assert_async().await;
    }

    #[tokio::test]
    async fn test_operations_require_configuration() {
        let resource = MariadbInstanceResource::new();
        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "tencentcloud_mariadb_instance".to_string(),
                    prior_state: object(vec![("id", Dynamic::from("tdsql-1"))]),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "Provider not configured");
    }

    #[tokio::test]
    async fn test_configure_rejects_foreign_provider_data() {
        let mut resource = MariadbInstanceResource::new();
        let response = resource
            .configure(
                Context::new(),
                ConfigureResourceRequest {
                    provider_data: Some(Arc::new("not provider data".to_string())),
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "Invalid provider data");
        assert!(resource.provider_data.is_none());
    }

    #[tokio::test]
    async fn test_import_passthrough() {
        let resource = MariadbInstanceResource::new();
        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "tencentcloud_mariadb_instance".to_string(),
                    id: "tdsql-1".to_string(),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;
        assert!(response.diagnostics.is_empty());
        assert_eq!(
            response.imported_resources[0]
                .state
                .get_string(&AttributePath::new("id"))
                .unwrap(),
            "tdsql-1"
        );
    }
}
