use ferrylink_proxy::{FileKind, ProbeResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct MetaQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetaResponse {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub ok: bool,
}

impl From<ProbeResult> for MetaResponse {
    fn from(probe: ProbeResult) -> Self {
        Self {
            name: probe.name,
            size: probe.size,
            kind: probe.kind,
            ok: true,
        }
    }
}
