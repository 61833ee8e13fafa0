//! Semantic groups and group selections used to filter annotations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::client::BecasError;

/// Biomedical concept categories recognised by the annotator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SemanticGroup {
    /// Species
    Spec,
    /// Anatomy
    Anat,
    /// Disorders
    Diso,
    /// Pathways
    Path,
    /// Chemicals
    Ched,
    /// Enzymes
    Enzy,
    /// microRNAs
    Mrna,
    /// Genes and proteins
    Prge,
    /// Cellular components
    Comp,
    /// Molecular functions
    Func,
    /// Biological processes
    Proc,
}

impl SemanticGroup {
    /// All groups, in the order the service documents them
    pub const ALL: [SemanticGroup; 11] = [
        SemanticGroup::Spec,
        SemanticGroup::Anat,
        SemanticGroup::Diso,
        SemanticGroup::Path,
        SemanticGroup::Ched,
        SemanticGroup::Enzy,
        SemanticGroup::Mrna,
        SemanticGroup::Prge,
        SemanticGroup::Comp,
        SemanticGroup::Func,
        SemanticGroup::Proc,
    ];

    /// Wire code of this group
    pub fn code(&self) -> &'static str {
        match self {
            SemanticGroup::Spec => "SPEC",
            SemanticGroup::Anat => "ANAT",
            SemanticGroup::Diso => "DISO",
            SemanticGroup::Path => "PATH",
            SemanticGroup::Ched => "CHED",
            SemanticGroup::Enzy => "ENZY",
            SemanticGroup::Mrna => "MRNA",
            SemanticGroup::Prge => "PRGE",
            SemanticGroup::Comp => "COMP",
            SemanticGroup::Func => "FUNC",
            SemanticGroup::Proc => "PROC",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            SemanticGroup::Spec => "Species",
            SemanticGroup::Anat => "Anatomy",
            SemanticGroup::Diso => "Disorders",
            SemanticGroup::Path => "Pathways",
            SemanticGroup::Ched => "Chemicals",
            SemanticGroup::Enzy => "Enzymes",
            SemanticGroup::Mrna => "microRNAs",
            SemanticGroup::Prge => "Genes and proteins",
            SemanticGroup::Comp => "Cellular components",
            SemanticGroup::Func => "Molecular functions",
            SemanticGroup::Proc => "Biological processes",
        }
    }
}

impl fmt::Display for SemanticGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SemanticGroup {
    type Err = BecasError;

    /// Codes are matched exactly; the service is case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SemanticGroup::ALL
            .iter()
            .copied()
            .find(|group| group.code() == s)
            .ok_or_else(|| BecasError::InvalidGroups(format!("Unknown group `{}`", s)))
    }
}

/// Which semantic groups to include in an annotation.
///
/// An empty selection means "no filter" and is never sent to the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupSelection(BTreeMap<SemanticGroup, bool>);

impl GroupSelection {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Include a group
    pub fn include(mut self, group: SemanticGroup) -> Self {
        self.0.insert(group, true);
        self
    }

    /// Explicitly exclude a group
    pub fn exclude(mut self, group: SemanticGroup) -> Self {
        self.0.insert(group, false);
        self
    }

    /// Set a group's flag in place
    pub fn set(&mut self, group: SemanticGroup, include: bool) {
        self.0.insert(group, include);
    }

    /// Flag for a group, if present in the selection
    pub fn get(&self, group: SemanticGroup) -> Option<bool> {
        self.0.get(&group).copied()
    }

    /// Build an all-true selection from a comma separated list such as
    /// `"PRGE,DISO,ANAT"`.
    pub fn from_codes(codes: &str) -> Result<Self, BecasError> {
        let mut selection = Self::new();
        for code in codes.split(',').map(str::trim) {
            if code.is_empty() {
                return Err(BecasError::InvalidGroups(format!(
                    "Empty group in `{}`",
                    codes
                )));
            }
            selection.set(code.parse()?, true);
        }
        Ok(selection)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(group, include)` pairs in code order
    pub fn iter(&self) -> impl Iterator<Item = (SemanticGroup, bool)> + '_ {
        self.0.iter().map(|(group, include)| (*group, *include))
    }

    /// Check that at least one group is selected.
    pub fn validate(&self) -> Result<(), BecasError> {
        if self.0.values().any(|include| *include) {
            Ok(())
        } else {
            Err(BecasError::InvalidGroups(
                "No `groups` selected for annotation. At least one group must be true"
                    .to_string(),
            ))
        }
    }
}

impl FromIterator<(SemanticGroup, bool)> for GroupSelection {
    fn from_iter<I: IntoIterator<Item = (SemanticGroup, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<SemanticGroup> for GroupSelection {
    fn from_iter<I: IntoIterator<Item = SemanticGroup>>(iter: I) -> Self {
        Self(iter.into_iter().map(|group| (group, true)).collect())
    }
}
