use serde_json::json;
use webflow_sanity_migrate::config::{
    EnhancementConfig, MigrationConfig, PacingConfig, ReportConfig, SanityConfig, WebflowConfig,
};
use webflow_sanity_migrate::{Migration, Phase};

fn config(webflow_url: String) -> MigrationConfig {
    MigrationConfig {
        webflow: WebflowConfig {
            api_token: "wf-token".to_string(),
            site_id: "site1".to_string(),
            base_url: webflow_url,
            page_size: 100,
        },
        sanity: SanityConfig {
            project_id: "abc123".to_string(),
            dataset: "production".to_string(),
            token: "sk-token".to_string(),
            api_version: "2024-01-01".to_string(),
            // A dry run must never touch the destination
            base_url: Some("http://127.0.0.1:1".to_string()),
        },
        enhancement: EnhancementConfig::default(),
        pacing: PacingConfig {
            request_delay_ms: 0,
            batch_size: 10,
            batch_delay_ms: 0,
        },
        report: ReportConfig::default(),
    }
}

#[tokio::test]
async fn test_dry_run_writes_nothing_and_counts_everything() {
    let mut webflow = mockito::Server::new_async().await;

    let collections = webflow
        .mock("GET", "/v2/sites/site1/collections")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "collections": [
                    {"id": "c-partners", "displayName": "Partners", "slug": "partners"},
                    {"id": "c-products", "displayName": "Products", "slug": "products"},
                    {"id": "c-blog", "displayName": "Blog Posts", "slug": "blog-posts"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let partners = webflow
        .mock("GET", "/v2/collections/c-partners/items")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [
                    {
                        "id": "655f0a1b2c3d4e5f6a7b8c9d",
                        "fieldData": {"name": "Acme Conveyors", "slug": "acme-conveyors"}
                    }
                ],
                "pagination": {"limit": 100, "offset": 0, "total": 1}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let products = webflow
        .mock("GET", "/v2/collections/c-products/items")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [
                    {
                        "id": "655f0a1b2c3d4e5f6a7b8100",
                        "fieldData": {
                            "name": "Belt Conveyor X2",
                            "slug": "belt-conveyor-x2",
                            "company": "655f0a1b2c3d4e5f6a7b8c9d"
                        }
                    },
                    {
                        "id": "655f0a1b2c3d4e5f6a7b8101",
                        "isDraft": true,
                        "fieldData": {"name": "Unreleased"}
                    }
                ],
                "pagination": {"limit": 100, "offset": 0, "total": 2}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let report = Migration::builder()
        .config(config(webflow.url()))
        .dry_run()
        .run()
        .await
        .unwrap();

    assert!(report.dry_run);
    assert!(report.failures.is_empty());

    let manufacturers = &report.collections["manufacturer"];
    assert_eq!(manufacturers.attempted, 1);
    assert_eq!(manufacturers.skipped, 1);
    assert_eq!(manufacturers.created, 0);

    let products_report = &report.collections["product"];
    assert_eq!(products_report.attempted, 2);
    // one dry-run skip plus one draft skip
    assert_eq!(products_report.skipped, 2);
    assert_eq!(products_report.unresolved_refs, 0);

    // the unrecognized collection never appears in the report
    assert!(report.collections.get("blogPost").is_none());

    collections.assert_async().await;
    partners.assert_async().await;
    products.assert_async().await;
}

#[tokio::test]
async fn test_unknown_only_collection_is_fatal() {
    let mut webflow = mockito::Server::new_async().await;
    let _collections = webflow
        .mock("GET", "/v2/sites/site1/collections")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"collections": []}"#)
        .create_async()
        .await;

    let result = Migration::builder()
        .config(config(webflow.url()))
        .only_collection("Nonexistent")
        .dry_run()
        .run()
        .await;

    assert!(matches!(
        result,
        Err(webflow_sanity_migrate::MigrateError::UnknownCollection(_))
    ));
}

#[tokio::test]
async fn test_discovery_only_run_touches_no_items() {
    let mut webflow = mockito::Server::new_async().await;
    let collections = webflow
        .mock("GET", "/v2/sites/site1/collections")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "collections": [
                    {"id": "c-partners", "displayName": "Partners", "slug": "partners"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;
    // Item listing must not happen in a discovery-only run
    let items = webflow
        .mock("GET", "/v2/collections/c-partners/items")
        .match_query(mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let report = Migration::builder()
        .config(config(webflow.url()))
        .phases([Phase::Discovery])
        .run()
        .await
        .unwrap();

    assert!(report.collections.is_empty());
    collections.assert_async().await;
    items.assert_async().await;
}
