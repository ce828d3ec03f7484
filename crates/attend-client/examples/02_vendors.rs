use anyhow::Result;
use attend_client::AttendClient;
use attend_types::{SortOrder, VendorCategory, VendorQuery};

#[tokio::main]
async fn main() -> Result<()> {
    let base_url = std::env::var("ATTEND_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8000/api".to_string());
    let client = AttendClient::with_base_url(base_url)?;

    let health = client.health().check().await?;
    println!("Backend: {}", health.status);

    for category in client.vendors().categories().await? {
        println!("{:<14} {:>3} vendors", category.category, category.count);
    }

    let query = VendorQuery::new()
        .category(VendorCategory::Venue)
        .min_rating(4.0)
        .sort("rating", SortOrder::Desc)
        .page(1, 5);
    let page = client.vendors().list(&query).await?;
    for vendor in &page.data {
        println!("#{} {} ({:.1})", vendor.id, vendor.details.name, vendor.details.rating);
    }

    Ok(())
}
