use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default = "first_page")]
    pub last_page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total: u64,
}

fn first_page() -> u32 {
    1
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            last_page: 1,
            per_page: 0,
            total: 0,
        }
    }
}

impl Pagination {
    /// Pagination for a result that fits in a single page
    pub fn single(total: usize) -> Self {
        Self {
            current_page: 1,
            last_page: 1,
            per_page: total as u32,
            total: total as u64,
        }
    }

    pub fn has_more(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn next_page(&self) -> Option<u32> {
        self.has_more().then(|| self.current_page + 1)
    }
}

/// A page of items together with its pagination metadata.
///
/// The backend uses two layouts for paginated lists: a nested one
/// (`{"data": [..], "pagination": {..}}`) and the flat paginator layout
/// (`{"current_page": 1, "data": [..], "last_page": 3, ..}`).
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T: DeserializeOwned> Paginated<T> {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(_) => {
                let data: Vec<T> = serde_json::from_value(value)?;
                let pagination = Pagination::single(data.len());
                Ok(Self { data, pagination })
            }
            Value::Object(mut map) => {
                let data = map.remove("data").unwrap_or_else(|| Value::Array(Vec::new()));
                let data: Vec<T> = serde_json::from_value(data)?;
                let pagination = match map.remove("pagination") {
                    Some(nested) => serde_json::from_value(nested)?,
                    None => serde_json::from_value(Value::Object(map))?,
                };
                Ok(Self { data, pagination })
            }
            other => Err(serde::de::Error::custom(format!(
                "expected paginated list, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_layout() {
        let page: Paginated<u32> = Paginated::from_value(json!({
            "success": true,
            "data": [1, 2, 3],
            "pagination": {"current_page": 1, "last_page": 2, "per_page": 3, "total": 5}
        }))
        .unwrap();
        assert_eq!(page.data, vec![1, 2, 3]);
        assert_eq!(page.pagination.next_page(), Some(2));
    }

    #[test]
    fn test_flat_layout() {
        let page: Paginated<u32> = Paginated::from_value(json!({
            "current_page": 2, "data": [4], "from": 4, "last_page": 2,
            "per_page": 3, "to": 4, "total": 4
        }))
        .unwrap();
        assert_eq!(page.pagination.current_page, 2);
        assert!(!page.pagination.has_more());
        assert_eq!(page.pagination.total, 4);
    }

    #[test]
    fn test_bare_array() {
        let page: Paginated<u32> = Paginated::from_value(json!([7, 8])).unwrap();
        assert_eq!(page.pagination, Pagination::single(2));
    }
}
