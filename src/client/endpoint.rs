//! Endpoint URL construction for the becas API.

use std::fmt;
use std::str::FromStr;

use super::BecasError;
use crate::models::Credentials;

/// Host and path prefix shared by every becas endpoint
pub const DEFAULT_ENDPOINT_PREFIX: &str = "bioinformatics.ua.pt/becas/api/";

/// The four remote operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AnnotateText,
    ExportText,
    AnnotatePublication,
    ExportPublication,
}

impl Operation {
    /// Tag used in logs and by [`FromStr`]
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::AnnotateText => "annotate_text",
            Operation::ExportText => "export_text",
            Operation::AnnotatePublication => "annotate_publication",
            Operation::ExportPublication => "export_publication",
        }
    }

    /// Path below the endpoint prefix. Publication paths end in `/` and are
    /// completed with the PMID.
    fn path(&self) -> &'static str {
        match self {
            Operation::AnnotateText => "text/annotate",
            Operation::ExportText => "text/export",
            Operation::AnnotatePublication => "pubmed/annotate/",
            Operation::ExportPublication => "pubmed/export/",
        }
    }

    /// Whether the operation addresses a PubMed publication
    pub fn is_publication(&self) -> bool {
        matches!(
            self,
            Operation::AnnotatePublication | Operation::ExportPublication
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = BecasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "annotate_text" => Ok(Operation::AnnotateText),
            "export_text" => Ok(Operation::ExportText),
            "annotate_publication" => Ok(Operation::AnnotatePublication),
            "export_publication" => Ok(Operation::ExportPublication),
            other => Err(BecasError::Internal(format!(
                "Unknown endpoint \"{}\"",
                other
            ))),
        }
    }
}

/// Builds authenticated endpoint URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResolver {
    prefix: String,
    secure: bool,
}

impl EndpointResolver {
    /// `prefix` is host plus path without a scheme, e.g.
    /// `bioinformatics.ua.pt/becas/api/`. A missing trailing slash is added.
    pub fn new(prefix: impl Into<String>, secure: bool) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { prefix, secure }
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// Fully qualified URL for `operation`, with the credentials as query
    /// parameters.
    pub fn resolve(
        &self,
        operation: Operation,
        credentials: &Credentials,
        pmid: Option<u64>,
    ) -> Result<String, BecasError> {
        let target = match (operation.is_publication(), pmid) {
            (true, Some(pmid)) => format!("{}{}", operation.path(), pmid),
            (false, None) => operation.path().to_string(),
            (true, None) => {
                return Err(BecasError::Internal(format!(
                    "Endpoint \"{}\" requires a PMID",
                    operation
                )))
            }
            (false, Some(_)) => {
                return Err(BecasError::Internal(format!(
                    "Endpoint \"{}\" does not take a PMID",
                    operation
                )))
            }
        };

        Ok(format!(
            "{}://{}{}?tool={}&email={}",
            self.scheme(),
            self.prefix,
            target,
            urlencoding::encode(&credentials.tool),
            urlencoding::encode(&credentials.email)
        ))
    }
}

impl Default for EndpointResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT_PREFIX, false)
    }
}
