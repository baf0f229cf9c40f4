use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateAliasRequest {
    pub url: String,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateAliasResponse {
    pub status: &'static str,
    pub alias: String,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub status: &'static str,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAliasRequest {
    #[serde(default)]
    pub new_alias: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateAliasResponse {
    pub status: &'static str,
    pub alias: String,
}
