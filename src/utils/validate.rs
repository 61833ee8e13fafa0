//! Pre-flight validation of request parameters.
//!
//! Every check here is pure and runs before any network I/O, so a caller
//! with bad input never consumes a rate-limit slot.

use serde_json::Value;

use crate::client::BecasError;
use crate::models::{Credentials, ExportFormat, GroupSelection, SemanticGroup};

/// Validate text to annotate
pub fn validate_text(text: &str) -> Result<(), BecasError> {
    if text.trim().is_empty() {
        return Err(BecasError::InvalidArgument(
            "Invalid `text` parameter".to_string(),
        ));
    }
    Ok(())
}

/// Validate a PubMed identifier
pub fn validate_pmid(pmid: u64) -> Result<(), BecasError> {
    if pmid == 0 {
        return Err(invalid_pmid());
    }
    Ok(())
}

/// Parse and validate a PubMed identifier given as text
pub fn parse_pmid(pmid: &str) -> Result<u64, BecasError> {
    let value: i64 = pmid.trim().parse().map_err(|_| invalid_pmid())?;
    if value <= 0 {
        return Err(invalid_pmid());
    }
    Ok(value as u64)
}

fn invalid_pmid() -> BecasError {
    BecasError::InvalidArgument("Invalid `pmid` parameter".to_string())
}

/// Validate a dynamically typed group selection such as `{"PRGE": true}`.
///
/// Keys must be semantic group codes, values strict booleans, and at least
/// one group must be selected.
pub fn validate_groups(groups: &Value) -> Result<GroupSelection, BecasError> {
    let map = groups.as_object().ok_or_else(|| {
        BecasError::InvalidGroups("If specified, `groups` must be an object".to_string())
    })?;

    let mut selection = GroupSelection::new();
    for (code, value) in map {
        let group: SemanticGroup = code.parse()?;
        let include = value.as_bool().ok_or_else(|| {
            BecasError::InvalidGroups(format!(
                "Invalid value `{}` for group `{}`. Must be boolean",
                value, code
            ))
        })?;
        selection.set(group, include);
    }

    selection.validate()?;
    Ok(selection)
}

/// Validate an export format name
pub fn validate_format(format: &str) -> Result<ExportFormat, BecasError> {
    format.parse()
}

/// Ensure the caller identified itself with an email and a tool name
pub fn validate_authentication(credentials: &Credentials) -> Result<(), BecasError> {
    if credentials.email.trim().is_empty() {
        return Err(BecasError::AuthenticationRequired(
            "Please set your email".to_string(),
        ));
    }
    if credentials.tool.trim().is_empty() {
        return Err(BecasError::AuthenticationRequired(
            "Please set your tool name".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_text() {
        assert!(validate_text("BRCA1 is a gene.").is_ok());
        assert!(validate_text("  x  ").is_ok());

        for blank in ["", " ", "\t\n", "\u{3000}"] {
            assert!(
                matches!(validate_text(blank), Err(BecasError::InvalidArgument(_))),
                "{:?} should be rejected",
                blank
            );
        }
    }

    #[test]
    fn test_validate_pmid() {
        assert!(validate_pmid(1).is_ok());
        assert!(validate_pmid(23225384).is_ok());
        assert!(matches!(
            validate_pmid(0),
            Err(BecasError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_pmid() {
        assert_eq!(parse_pmid("23225384").unwrap(), 23225384);
        assert_eq!(parse_pmid(" 42 ").unwrap(), 42);

        for bad in ["0", "-5", "abc", "1.5", ""] {
            assert!(
                matches!(parse_pmid(bad), Err(BecasError::InvalidArgument(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_validate_groups_accepts_known_true_group() {
        let selection = validate_groups(&json!({"PRGE": true})).unwrap();
        assert_eq!(selection.get(SemanticGroup::Prge), Some(true));

        let selection = validate_groups(&json!({"PRGE": true, "DISO": false})).unwrap();
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_validate_groups_rejects_bad_selections() {
        let cases = [
            json!({"XXXX": true}),
            json!({"PRGE": "yes"}),
            json!({"PRGE": 1}),
            json!({"PRGE": false}),
            json!({"PRGE": false, "DISO": false}),
            json!(["PRGE"]),
            json!("PRGE"),
        ];
        for case in cases {
            assert!(
                matches!(validate_groups(&case), Err(BecasError::InvalidGroups(_))),
                "{} should be rejected",
                case
            );
        }
    }

    #[test]
    fn test_validate_format() {
        for name in ["json", "xml", "a1", "conll"] {
            assert_eq!(validate_format(name).unwrap().as_str(), name);
        }
        assert!(matches!(
            validate_format("pdf"),
            Err(BecasError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_validate_authentication() {
        assert!(validate_authentication(&Credentials::new("you@example.com")).is_ok());

        let err = validate_authentication(&Credentials::new("   ")).unwrap_err();
        assert_eq!(
            err,
            BecasError::AuthenticationRequired("Please set your email".to_string())
        );

        let err = validate_authentication(&Credentials::new("you@example.com").tool(""))
            .unwrap_err();
        assert_eq!(
            err,
            BecasError::AuthenticationRequired("Please set your tool name".to_string())
        );
    }
}
