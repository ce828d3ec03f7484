use attend_types::{decode_tolerant, Paginated, Vendor, VendorCategoryCount, VendorDraft, VendorQuery, VendorStats};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::client::AttendClient;
use crate::error::Result;

pub struct VendorEndpoints<'a> {
    client: &'a AttendClient,
}

impl<'a> VendorEndpoints<'a> {
    pub(crate) fn new(client: &'a AttendClient) -> Self {
        Self { client }
    }

    /// Filtered, sorted, paginated vendor list
    pub async fn list(&self, query: &VendorQuery) -> Result<Paginated<Vendor>> {
        // The pagination sits next to `data`, so the envelope is read whole
        let value = self.client.get_value("vendors", Some(query)).await?;
        Ok(Paginated::from_value(value)?)
    }

    pub async fn get(&self, id: i64) -> Result<Vendor> {
        self.client.get(&format!("vendors/{}", id), None::<&()>).await
    }

    pub async fn create(&self, vendor: &VendorDraft) -> Result<Vendor> {
        tracing::info!(name = %vendor.name, category = %vendor.category, "Creating vendor");
        self.client.send(Method::POST, "vendors", Some(vendor)).await
    }

    /// Partial update; `patch` holds only the fields to change
    pub async fn update<B>(&self, id: i64, patch: &B) -> Result<Vendor>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.client.send(Method::PUT, &format!("vendors/{}", id), Some(patch)).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        tracing::info!(vendor_id = id, "Deleting vendor");
        let value = self
            .client
            .send_value(Method::DELETE, &format!("vendors/{}", id), None::<&()>)
            .await?;
        ensure_accepted(value)
    }

    pub async fn categories(&self) -> Result<Vec<VendorCategoryCount>> {
        self.client.get("vendors-categories", None::<&()>).await
    }

    pub async fn stats(&self) -> Result<VendorStats> {
        self.client.get("vendors-stats", None::<&()>).await
    }
}

/// Surface `{"success": false, ..}` bodies of calls whose payload is ignored
pub(crate) fn ensure_accepted(value: Value) -> Result<()> {
    if !value.is_null() {
        decode_tolerant::<Value>(value)?;
    }
    Ok(())
}
