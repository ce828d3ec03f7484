use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::message::lenient_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VendorCategory {
    Catering,
    Venue,
    Photography,
    Entertainment,
    Decoration,
    Transportation,
    Planning,
    #[default]
    #[serde(other)]
    Other,
}

impl VendorCategory {
    pub const ALL: [VendorCategory; 8] = [
        VendorCategory::Catering,
        VendorCategory::Venue,
        VendorCategory::Photography,
        VendorCategory::Entertainment,
        VendorCategory::Decoration,
        VendorCategory::Transportation,
        VendorCategory::Planning,
        VendorCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VendorCategory::Catering => "catering",
            VendorCategory::Venue => "venue",
            VendorCategory::Photography => "photography",
            VendorCategory::Entertainment => "entertainment",
            VendorCategory::Decoration => "decoration",
            VendorCategory::Transportation => "transportation",
            VendorCategory::Planning => "planning",
            VendorCategory::Other => "other",
        }
    }
}

impl fmt::Display for VendorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VendorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        VendorCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown vendor category: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VendorLocation {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub service_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VendorContact {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VendorPackage {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VendorPricing {
    #[serde(default)]
    pub base_rate: f64,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub minimum_order: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<VendorPackage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VendorAvailability {
    #[serde(default)]
    pub lead_time: u32,
    #[serde(default, rename = "seasonal_restrictions", skip_serializing_if = "Vec::is_empty")]
    pub seasonal_restrictions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VendorCredentials {
    #[serde(default)]
    pub licensed: bool,
    #[serde(default)]
    pub insured: bool,
    #[serde(default)]
    pub years_in_business: u32,
}

/// Vendor fields supplied by the user when creating or updating a vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VendorDraft {
    pub name: String,
    #[serde(default)]
    pub category: VendorCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub location: VendorLocation,
    #[serde(default)]
    pub contact: VendorContact,
    #[serde(default)]
    pub pricing: VendorPricing,
    #[serde(default)]
    pub availability: VendorAvailability,
    #[serde(default)]
    pub credentials: VendorCredentials,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: i64,
    #[serde(flatten)]
    pub details: VendorDraft,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Filter, sort and paging options for `GET /vendors`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VendorQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<VendorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl VendorQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: VendorCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order);
        self
    }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorCategoryCount {
    pub category: String,
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VendorStats {
    #[serde(default)]
    pub total_vendors: u64,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub top_rated: u64,
    #[serde(default)]
    pub by_category: Vec<VendorCategoryCount>,
    #[serde(default)]
    pub recent_additions: u64,
}
