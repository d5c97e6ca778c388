//! Render submission payload.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::mode::RenderMode;
use crate::style::StylePreset;

/// Request to render a script into a narrated video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Plain-text script
    pub script: String,
    /// Visual style preset
    #[serde(default)]
    pub style: StylePreset,
    /// Which steps to run
    #[serde(default)]
    pub mode: RenderMode,
    /// Per-request cost ceiling; the worker default applies when absent
    #[serde(default, rename = "planLimitUSD", skip_serializing_if = "Option::is_none")]
    pub plan_limit_usd: Option<f64>,
}

impl RenderRequest {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            style: StylePreset::default(),
            mode: RenderMode::default(),
            plan_limit_usd: None,
        }
    }

    pub fn with_style(mut self, style: StylePreset) -> Self {
        self.style = style;
        self
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_plan_limit(mut self, limit_usd: f64) -> Self {
        self.plan_limit_usd = Some(limit_usd);
        self
    }

    /// Reject empty or whitespace-only scripts and nonsensical limits.
    pub fn validate(&self) -> ModelResult<()> {
        if self.script.trim().is_empty() {
            return Err(ModelError::validation("Script required"));
        }
        if let Some(limit) = self.plan_limit_usd {
            if !limit.is_finite() || limit < 0.0 {
                return Err(ModelError::validation(format!(
                    "planLimitUSD must be a non-negative number, got {}",
                    limit
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_blank_script() {
        assert!(RenderRequest::new("").validate().is_err());
        assert!(RenderRequest::new("   \n\t").validate().is_err());
        assert!(RenderRequest::new("Once upon a time").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_limit() {
        let req = RenderRequest::new("hello").with_plan_limit(-1.0);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_defaults_from_json() {
        let req: RenderRequest = serde_json::from_str(r#"{"script":"hi"}"#).unwrap();
        assert_eq!(req.mode, RenderMode::Full);
        assert_eq!(req.style, StylePreset::Cinematic);
        assert!(req.plan_limit_usd.is_none());

        let req: RenderRequest =
            serde_json::from_str(r#"{"script":"hi","style":"noir","mode":"audio"}"#).unwrap();
        assert_eq!(req.mode, RenderMode::Audio);
        assert_eq!(req.style, StylePreset::Noir);
    }
}
