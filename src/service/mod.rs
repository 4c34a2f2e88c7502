use crate::config::{AiConfig, ScanConfig};

mod activity;
mod ai;
mod deps;
mod git;
mod http;
mod scan;

pub use activity::{ActivityStatus, ActivityTracker, IDLE_THRESHOLD};
pub use deps::{ManifestError, ManifestScan};
pub use git::GitRepo;
pub use http::{AI_BODY_LIMIT, DISPLAY_BODY_LIMIT, HTTP_TIMEOUT, parse_header_arg, parse_json_headers};

/// Service behind every developer tool
#[derive(Clone)]
pub struct DevService {
    ai: AiConfig,
    scan: ScanConfig,
}

impl DevService {
    /// Creates a new instance of `DevService`
    pub fn new(ai: AiConfig, scan: ScanConfig) -> Self {
        Self { ai, scan }
    }

    /// Configuration of the large file scanner
    pub fn scan_config(&self) -> &ScanConfig {
        &self.scan
    }
}
