use serde::{Deserialize, Serialize};

use crate::model::ModelStatus;
use crate::Platform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub id: Platform,
    pub name: String,
    pub ad_types: Vec<String>,
    pub min_budget: u32,
}

impl From<Platform> for PlatformInfo {
    fn from(platform: Platform) -> Self {
        Self {
            id: platform,
            name: platform.display_name().to_string(),
            ad_types: platform.ad_types().iter().map(|kind| kind.to_string()).collect(),
            min_budget: platform.min_budget(),
        }
    }
}

pub fn platform_catalog() -> Vec<PlatformInfo> {
    Platform::ALL.iter().copied().map(PlatformInfo::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub model: ModelStatus,
}

impl HealthResponse {
    pub fn healthy(model: ModelStatus) -> Self {
        Self {
            status: "healthy",
            message: "Campaign advisor API is running",
            model,
        }
    }
}
