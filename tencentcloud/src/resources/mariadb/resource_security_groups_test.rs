#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::api::test_helpers::{create_test_client, response_body};
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use tfplug::types::{ClientCapabilities, Dynamic, DynamicValue};

    fn configured(server_url: &str) -> MariadbSecurityGroupsResource {
        MariadbSecurityGroupsResource {
            provider_data: Some(TencentCloudProviderData {
                client: Arc::new(create_test_client(server_url)),
            }),
        }
    }

    fn value(id: Dynamic) -> DynamicValue {
        DynamicValue::new(Dynamic::Map(
            [
                ("id", id),
                ("instance_id", Dynamic::from("tdsql-1")),
                ("security_group_id", Dynamic::from("sg-1")),
                ("product", Dynamic::from("mariadb")),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        ))
    }

    fn groups_body(ids: &[&str]) -> String {
        let groups: Vec<_> = ids
            .iter()
            .map(|id| serde_json::json!({"SecurityGroupId": id, "SecurityGroupName": "default"}))
            .collect();
        response_body(serde_json::json!({"Groups": groups, "VIP": "10.0.0.8", "VPort": 3306}))
    }

    #[test]
    fn test_binding_id_round_trips() {
        let binding = Binding::parse("tdsql-1#sg-1#mariadb").unwrap();
        assert_eq!(binding.security_group_id, "sg-1");
        assert_eq!(binding.id(), "tdsql-1#sg-1#mariadb");
        assert!(Binding::parse("tdsql-1#sg-1").is_err());
    }

    #[tokio::test]
    async fn test_resource_schema_forces_new() {
        let response = MariadbSecurityGroupsResource::new()
            .schema(Context::new(), ResourceSchemaRequest)
            .await;
        for name in ARGS {
            let attr = response.schema.block.attribute(name).unwrap();
            assert!(attr.required);
            assert_eq!(attr.plan_modifiers.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_create_associates() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "AssociateSecurityGroups")
            .match_body(Matcher::Json(serde_json::json!({
                "Product": "mariadb",
                "SecurityGroupId": "sg-1",
                "InstanceIds": ["tdsql-1"]
            })))
            .with_body(response_body(serde_json::json!({})))
            .create_async()
            .await;

        let response = configured(&server.url())
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "tencentcloud_mariadb_security_groups".to_string(),
                    planned_state: value(Dynamic::Unknown),
                    config: value(Dynamic::Null),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            response.new_state.get_string(&AttributePath::new("id")).unwrap(),
            "tdsql-1#sg-1#mariadb"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_reports_every_missing_argument() {
        let config = DynamicValue::new(Dynamic::Map(Default::default()));
        let response = configured("http://127.0.0.1:1")
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "tencentcloud_mariadb_security_groups".to_string(),
                    planned_state: config.clone(),
                    config,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;
        assert_eq!(response.diagnostics.len(), 3);
    }

    #[tokio::test]
    async fn test_read_keeps_bound_group() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeDBSecurityGroups")
            .with_body(groups_body(&["sg-0", "sg-1"]))
            .create_async()
            .await;

        let current = value(Dynamic::from("tdsql-1#sg-1#mariadb"));
        let response = configured(&server.url())
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "tencentcloud_mariadb_security_groups".to_string(),
                    current_state: current.clone(),
                    private: vec![],
                    provider_meta: None,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert_eq!(response.new_state, Some(current));
    }

    #[tokio::test]
    async fn test_read_unbound_group_removes_state() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeDBSecurityGroups")
            .with_body(groups_body(&["sg-0"]))
            .create_async()
            .await;

        let response = configured(&server.url())
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "tencentcloud_mariadb_security_groups".to_string(),
                    current_state: value(Dynamic::from("tdsql-1#sg-1#mariadb")),
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
    async fn test_delete_disassociates() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DisassociateSecurityGroups")
            .with_body(response_body(serde_json::json!({})))
            .create_async()
            .await;

        let response = configured(&server.url())
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "tencentcloud_mariadb_security_groups".to_string(),
                    prior_state: value(Dynamic::from("tdsql-1#sg-1#mariadb")),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        mock.assert_async().await;
    }
}
