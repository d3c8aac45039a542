use serde::Serialize;

use crate::models::Tunnel;

use super::{ApiClient, ApiError};

#[derive(Serialize)]
struct CreateTunnelBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct CreateDnsRecordBody<'a> {
    domain: &'a str,
}

impl ApiClient {
    /// List all tunnels
    pub async fn list_tunnels(&self) -> Result<Vec<Tunnel>, ApiError> {
        self.get("/tunnel").await
    }

    /// Fetch a single tunnel with its DNS records
    pub async fn tunnel(&self, id: &str) -> Result<Tunnel, ApiError> {
        self.get(&format!("/tunnel/{}", id)).await
    }

    pub async fn create_tunnel(&self, name: &str) -> Result<Tunnel, ApiError> {
        self.post("/tunnel", &CreateTunnelBody { name }).await
    }

    pub async fn delete_tunnel(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/tunnel/{}", id)).await
    }

    /// Route `domain` to the tunnel, returning the updated tunnel
    pub async fn create_dns_record(&self, id: &str, domain: &str) -> Result<Tunnel, ApiError> {
        self.post(&format!("/tunnel/dns/{}", id), &CreateDnsRecordBody { domain })
            .await
    }

    pub async fn start_tunnel(&self, id: &str) -> Result<(), ApiError> {
        self.put_no_content(&format!("/tunnel/{}/start", id)).await
    }

    pub async fn stop_tunnel(&self, id: &str) -> Result<(), ApiError> {
        self.put_no_content(&format!("/tunnel/{}/stop", id)).await
    }

    pub async fn restart_tunnel(&self, id: &str) -> Result<(), ApiError> {
        self.put_no_content(&format!("/tunnel/{}/restart", id)).await
    }
}
