use attend_client::AttendClient;
use attend_types::{BotConfigUpdate, SortOrder, VendorCategory, VendorQuery};
use mockito::{Matcher, Server};
use serde_json::json;

#[tokio::test]
async fn test_vendor_list_with_filters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/vendors")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("category".into(), "venue".into()),
            Matcher::UrlEncoded("sort_by".into(), "rating".into()),
            Matcher::UrlEncoded("sort_order".into(), "desc".into()),
            Matcher::UrlEncoded("page".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "data": [
                    {"id": 11, "name": "Harbor Hall", "category": "venue", "rating": 4.8, "reviews": 120},
                    {"id": 12, "name": "Old Mill", "category": "venue", "rating": 4.5, "reviews": 40}
                ],
                "pagination": {"current_page": 2, "last_page": 4, "per_page": 2, "total": 8}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = AttendClient::with_base_url(server.url()).unwrap();
    let query = VendorQuery::new()
        .category(VendorCategory::Venue)
        .sort("rating", SortOrder::Desc)
        .page(2, 2);
    let page = client.vendors().list(&query).await.unwrap();

    mock.assert_async().await;
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].details.name, "Harbor Hall");
    assert_eq!(page.pagination.next_page(), Some(3));
}

#[tokio::test]
async fn test_vendor_delete_and_stats() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", "/vendors/11")
        .with_status(200)
        .with_body(json!({"success": true, "message": "Vendor deleted"}).to_string())
        .create_async()
        .await;
    let _stats = server
        .mock("GET", "/vendors-stats")
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "data": {
                    "total_vendors": 8,
                    "average_rating": 4.4,
                    "top_rated": 3,
                    "by_category": [{"category": "venue", "count": 8, "avg_rating": 4.4}],
                    "recent_additions": 1
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = AttendClient::with_base_url(server.url()).unwrap();
    client.vendors().delete(11).await.unwrap();
    delete.assert_async().await;

    let stats = client.vendors().stats().await.unwrap();
    assert_eq!(stats.total_vendors, 8);
    assert_eq!(stats.by_category[0].category, "venue");
}

#[tokio::test]
async fn test_bot_config_update_and_reset() {
    let mut server = Server::new_async().await;
    let update = server
        .mock("PUT", "/bot-config")
        .match_body(Matcher::Json(json!({"systemPrompt": "You plan weddings."})))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "data": {"systemPrompt": "You plan weddings.", "contextData": [], "personality": ["warm"]}
            })
            .to_string(),
        )
        .create_async()
        .await;
    let _reset = server
        .mock("POST", "/bot-config/reset")
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "data": {"systemPrompt": "default", "contextData": ["faq"], "personality": {"tone": "friendly"}}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = AttendClient::with_base_url(server.url()).unwrap();
    let config = client
        .bot_config()
        .update(&BotConfigUpdate::new().system_prompt("You plan weddings."))
        .await
        .unwrap();
    update.assert_async().await;
    assert_eq!(config.system_prompt, "You plan weddings.");

    let config = client.bot_config().reset().await.unwrap();
    assert_eq!(config.context_data, vec!["faq".to_string()]);
    assert_eq!(config.personality["tone"], "friendly");
}

#[tokio::test]
async fn test_health_check_bare_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body(json!({"status": "ok", "timestamp": "2024-05-01T10:00:00Z", "service": "attend-agent"}).to_string())
        .create_async()
        .await;

    let client = AttendClient::with_base_url(server.url()).unwrap();
    let health = client.health().check().await.unwrap();

    assert!(health.is_ok());
    assert_eq!(health.service.as_deref(), Some("attend-agent"));
}
