use attend_types::HealthStatus;

use crate::client::AttendClient;
use crate::error::Result;

pub struct HealthEndpoints<'a> {
    client: &'a AttendClient,
}

impl<'a> HealthEndpoints<'a> {
    pub(crate) fn new(client: &'a AttendClient) -> Self {
        Self { client }
    }

    /// `GET /health`
    pub async fn check(&self) -> Result<HealthStatus> {
        self.client.get("health", None::<&()>).await
    }
}
