use async_trait::async_trait;
use serde_json::json;
use webflow_sanity_migrate::config::{
    EnhancementConfig, MigrationConfig, PacingConfig, ReportConfig, SanityConfig, WebflowConfig,
};
use webflow_sanity_migrate::{Enhancer, MigrateError, Migration};

fn config(webflow_url: String, sanity_url: String) -> MigrationConfig {
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
            base_url: Some(sanity_url),
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

/// Full run against mocked vendor APIs: one manufacturer, one product with a
/// reference to it and a hero image. Verifies upserts, the reference patch,
/// the manufacturer back-link patch, and the image relay.
#[tokio::test]
async fn test_full_migration_run() {
    let mut webflow = mockito::Server::new_async().await;
    let mut sanity = mockito::Server::new_async().await;

    let image_url = format!("{}/uploads/x2-hero.jpg", webflow.url());

    let _collections = webflow
        .mock("GET", "/v2/sites/site1/collections")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "collections": [
                    {"id": "c-products", "displayName": "Products", "slug": "products"},
                    {"id": "c-partners", "displayName": "Partners", "slug": "partners"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let _partners = webflow
        .mock("GET", "/v2/collections/c-partners/items")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [{
                    "id": "655f0a1b2c3d4e5f6a7b8c9d",
                    "fieldData": {
                        "name": "Acme Conveyors",
                        "slug": "acme-conveyors",
                        "website-link": "https://acme.example.com"
                    }
                }],
                "pagination": {"limit": 100, "offset": 0, "total": 1}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let _products = webflow
        .mock("GET", "/v2/collections/c-products/items")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [{
                    "id": "655f0a1b2c3d4e5f6a7b8100",
                    "fieldData": {
                        "name": "Belt Conveyor X2",
                        "slug": "belt-conveyor-x2",
                        "company": "655f0a1b2c3d4e5f6a7b8c9d",
                        "main-image": {"url": image_url, "alt": "Conveyor X2"}
                    }
                }],
                "pagination": {"limit": 100, "offset": 0, "total": 1}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let image_download = webflow
        .mock("GET", "/uploads/x2-hero.jpg")
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body(vec![0xff, 0xd8, 0xff])
        .create_async()
        .await;

    // No documents exist yet: both upsert lookups miss
    let lookup = sanity
        .mock("GET", "/v2024-01-01/data/query/production")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"result": null}"#)
        .expect(2)
        .create_async()
        .await;

    // 2 creates + 1 product reference patch + 1 manufacturer back-link patch
    // + 1 product image patch
    let mutate = sanity
        .mock("POST", "/v2024-01-01/data/mutate/production")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"transactionId": "t", "results": []}"#)
        .expect(5)
        .create_async()
        .await;

    let asset_upload = sanity
        .mock("POST", "/v2024-01-01/assets/images/production")
        .match_query(mockito::Matcher::UrlEncoded(
            "filename".into(),
            "x2-hero.jpg".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"document": {"_id": "image-x2-1200x800-jpg"}}"#)
        .create_async()
        .await;

    let report = Migration::builder()
        .config(config(webflow.url(), sanity.url()))
        .run()
        .await
        .unwrap();

    assert!(report.failures.is_empty(), "failures: {:?}", report.failures);

    let manufacturers = &report.collections["manufacturer"];
    assert_eq!(manufacturers.created, 1);
    assert_eq!(manufacturers.failed, 0);

    let products = &report.collections["product"];
    assert_eq!(products.created, 1);
    assert_eq!(products.images_uploaded, 1);
    assert_eq!(products.unresolved_refs, 0);

    lookup.assert_async().await;
    mutate.assert_async().await;
    asset_upload.assert_async().await;
    image_download.assert_async().await;
}

struct CannedEnhancer;

#[async_trait]
impl Enhancer for CannedEnhancer {
    fn provider_name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, _: &str, _: &str) -> Result<String, MigrateError> {
        Ok("Upgraded copy.".to_string())
    }

    async fn complete_with_image(
        &self,
        _: &str,
        _: &[u8],
        _: &str,
    ) -> Result<String, MigrateError> {
        Ok("Upgraded copy.".to_string())
    }
}

/// A description that arrived as rich text (so it was already converted to
/// blocks) must still reach the enhancer, and the rewrite must land back as
/// blocks in the created document.
#[tokio::test]
async fn test_rich_text_description_is_enhanced() {
    let mut webflow = mockito::Server::new_async().await;
    let mut sanity = mockito::Server::new_async().await;

    let _collections = webflow
        .mock("GET", "/v2/sites/site1/collections")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "collections": [
                    {"id": "c-cats", "displayName": "Categories", "slug": "categories"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let _items = webflow
        .mock("GET", "/v2/collections/c-cats/items")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [{
                    "id": "655f0a1b2c3d4e5f6a7b8300",
                    "fieldData": {
                        "name": "Conveyors",
                        "slug": "conveyors",
                        "description": "<p>Old words about belts.</p>"
                    }
                }],
                "pagination": {"limit": 100, "offset": 0, "total": 1}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let _lookup = sanity
        .mock("GET", "/v2024-01-01/data/query/production")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"result": null}"#)
        .create_async()
        .await;

    let mutate = sanity
        .mock("POST", "/v2024-01-01/data/mutate/production")
        .match_body(mockito::Matcher::PartialJsonString(
            json!({
                "mutations": [{
                    "createIfNotExists": {
                        "description": [{
                            "_type": "block",
                            "children": [{"text": "Upgraded copy."}]
                        }]
                    }
                }]
            })
            .to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"transactionId": "t", "results": []}"#)
        .create_async()
        .await;

    let report = Migration::builder()
        .config(config(webflow.url(), sanity.url()))
        .enhancer(Box::new(CannedEnhancer))
        .run()
        .await
        .unwrap();

    let categories = &report.collections["category"];
    assert_eq!(categories.created, 1);
    // one description rewrite plus one generated tag list
    assert_eq!(categories.enhanced, 2);
    mutate.assert_async().await;
}

/// Re-running against a dataset that already holds the documents must replace
/// rather than create.
#[tokio::test]
async fn test_rerun_replaces_instead_of_creating() {
    let mut webflow = mockito::Server::new_async().await;
    let mut sanity = mockito::Server::new_async().await;

    let _collections = webflow
        .mock("GET", "/v2/sites/site1/collections")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "collections": [
                    {"id": "c-cats", "displayName": "Categories", "slug": "categories"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let _items = webflow
        .mock("GET", "/v2/collections/c-cats/items")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [{
                    "id": "655f0a1b2c3d4e5f6a7b8200",
                    "fieldData": {"name": "Conveyors", "slug": "conveyors"}
                }],
                "pagination": {"limit": 100, "offset": 0, "total": 1}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let _lookup = sanity
        .mock("GET", "/v2024-01-01/data/query/production")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"result": "category-655f0a1b2c3d4e5f6a7b8200"}"#)
        .create_async()
        .await;

    let mutate = sanity
        .mock("POST", "/v2024-01-01/data/mutate/production")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"mutations": [{"createOrReplace": {"_id": "category-655f0a1b2c3d4e5f6a7b8200"}}]}"#
                .to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"transactionId": "t", "results": []}"#)
        .create_async()
        .await;

    let report = Migration::builder()
        .config(config(webflow.url(), sanity.url()))
        .run()
        .await
        .unwrap();

    let categories = &report.collections["category"];
    assert_eq!(categories.created, 0);
    assert_eq!(categories.replaced, 1);
    mutate.assert_async().await;
}
