use serde::Deserialize;

/// Systems registered to the authenticated account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceData {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub system_details: Vec<SystemDetail>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemDetail {
    pub system_id: String,
    #[serde(default)]
    pub name: Option<String>,
}
