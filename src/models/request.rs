//! Credentials, export formats and request payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::GroupSelection;
use crate::client::BecasError;

/// Tool name sent when the caller does not choose one
pub const DEFAULT_TOOL: &str = "becas-python";

/// Decoded result of an annotate operation
pub type Annotations = serde_json::Map<String, serde_json::Value>;

/// API authentication parameters.
///
/// The service identifies callers by email so operators can reach them
/// before blocking excessive usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub tool: String,
}

impl Credentials {
    /// Credentials with the default tool name
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            tool: DEFAULT_TOOL.to_string(),
        }
    }

    /// Set the tool name
    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("")
    }
}

/// Output formats available for text export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// JSON with concept metadata
    Json,
    /// IeXML
    Xml,
    /// BioNLP A1 standoff
    A1,
    /// CoNLL
    Conll,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Json,
        ExportFormat::Xml,
        ExportFormat::A1,
        ExportFormat::Conll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Xml => "xml",
            ExportFormat::A1 => "a1",
            ExportFormat::Conll => "conll",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = BecasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportFormat::ALL
            .iter()
            .copied()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| BecasError::InvalidFormat(format!("Unknown format `{}`", s)))
    }
}

/// JSON body posted to the service.
///
/// Publication operations carry the PMID in the URL path, so their payload
/// holds at most a group selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Payload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<&'a GroupSelection>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub echo: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ExportFormat>,
}

impl<'a> Payload<'a> {
    pub fn text(text: &'a str) -> Self {
        Self {
            text: Some(text),
            ..Default::default()
        }
    }

    pub fn publication() -> Self {
        Self::default()
    }

    /// Attach a group filter; empty selections are dropped.
    pub fn groups(mut self, groups: Option<&'a GroupSelection>) -> Self {
        self.groups = groups.filter(|g| !g.is_empty());
        self
    }

    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn format(mut self, format: ExportFormat) -> Self {
        self.format = Some(format);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SemanticGroup;
    use serde_json::json;

    #[test]
    fn test_credentials_default_tool() {
        let credentials = Credentials::new("you@example.com");
        assert_eq!(credentials.tool, "becas-python");

        let credentials = credentials.tool("my-pipeline");
        assert_eq!(credentials.tool, "my-pipeline");
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("conll".parse::<ExportFormat>().unwrap(), ExportFormat::Conll);
        assert_eq!(ExportFormat::A1.to_string(), "a1");
        assert!(matches!(
            "JSON".parse::<ExportFormat>(),
            Err(BecasError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_text_payload_omits_defaults() {
        let payload = Payload::text("BRCA1 is a gene.");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"text": "BRCA1 is a gene."})
        );
    }

    #[test]
    fn test_payload_with_everything() {
        let groups = GroupSelection::new().include(SemanticGroup::Prge);
        let payload = Payload::text("BRCA1")
            .groups(Some(&groups))
            .echo(true)
            .format(ExportFormat::Xml);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"text": "BRCA1", "groups": {"PRGE": true}, "echo": true, "format": "xml"})
        );
    }

    #[test]
    fn test_empty_groups_are_not_sent() {
        let groups = GroupSelection::new();
        let payload = Payload::publication().groups(Some(&groups));
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({}));
    }
}
