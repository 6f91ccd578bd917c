use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::constraint::ConstraintError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Enzyme {
    Trypsin,
    Chymotrypsin,
    Elastase,
    Clostripain,
    CyanogenBromide,
    Iodosobenzoate,
    ProlineEndopeptidase,
    StaphProtease,
    #[serde(rename = "aspn")]
    AspN,
    ModifiedChymotrypsin,
    ElastaseTrypsinChymotrypsin,
    Custom,
    NoEnzyme,
}

impl Enzyme {
    const ALL: [Enzyme; 13] = [
        Enzyme::Trypsin,
        Enzyme::Chymotrypsin,
        Enzyme::Elastase,
        Enzyme::Clostripain,
        Enzyme::CyanogenBromide,
        Enzyme::Iodosobenzoate,
        Enzyme::ProlineEndopeptidase,
        Enzyme::StaphProtease,
        Enzyme::AspN,
        Enzyme::ModifiedChymotrypsin,
        Enzyme::ElastaseTrypsinChymotrypsin,
        Enzyme::Custom,
        Enzyme::NoEnzyme,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Enzyme::Trypsin => "trypsin",
            Enzyme::Chymotrypsin => "chymotrypsin",
            Enzyme::Elastase => "elastase",
            Enzyme::Clostripain => "clostripain",
            Enzyme::CyanogenBromide => "cyanogen-bromide",
            Enzyme::Iodosobenzoate => "iodosobenzoate",
            Enzyme::ProlineEndopeptidase => "proline-endopeptidase",
            Enzyme::StaphProtease => "staph-protease",
            Enzyme::AspN => "aspn",
            Enzyme::ModifiedChymotrypsin => "modified-chymotrypsin",
            Enzyme::ElastaseTrypsinChymotrypsin => "elastase-trypsin-chymotrypsin",
            Enzyme::Custom => "custom",
            Enzyme::NoEnzyme => "no-enzyme",
        }
    }

    /// Whether the bond between `pre` and `post` is cleaved by a built-in enzyme.
    ///
    /// `post` is `None` after the last residue of a protein. Returns `None` for
    /// [`Enzyme::Custom`], whose rules live in [`CustomResidueRules`].
    pub fn cleaves(self, pre: u8, post: Option<u8>) -> Option<bool> {
        let not_before_proline = post != Some(b'P');
        let site = match self {
            Enzyme::Trypsin => matches!(pre, b'K' | b'R') && not_before_proline,
            Enzyme::Chymotrypsin => matches!(pre, b'F' | b'W' | b'Y') && not_before_proline,
            Enzyme::ModifiedChymotrypsin => {
                matches!(pre, b'F' | b'L' | b'W' | b'Y') && not_before_proline
            }
            Enzyme::Elastase => matches!(pre, b'A' | b'L' | b'I' | b'V') && not_before_proline,
            Enzyme::ElastaseTrypsinChymotrypsin => {
                matches!(
                    pre,
                    b'A' | b'L' | b'I' | b'V' | b'K' | b'R' | b'W' | b'F' | b'Y'
                ) && not_before_proline
            }
            Enzyme::Clostripain => pre == b'R',
            Enzyme::CyanogenBromide => pre == b'M',
            Enzyme::Iodosobenzoate => pre == b'W',
            Enzyme::ProlineEndopeptidase => pre == b'P',
            Enzyme::StaphProtease => pre == b'E',
            Enzyme::AspN => post == Some(b'D'),
            Enzyme::NoEnzyme => true,
            Enzyme::Custom => return None,
        };
        Some(site)
    }
}

impl fmt::Display for Enzyme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Enzyme {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Enzyme::ALL
            .into_iter()
            .find(|enzyme| enzyme.name() == wanted)
            .ok_or_else(|| ConstraintError::UnknownEnzyme(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Digestion {
    #[serde(rename = "full-digest")]
    Full,
    #[serde(rename = "partial-digest")]
    Partial,
    #[serde(rename = "non-specific-digest")]
    NonSpecific,
}

impl Digestion {
    pub fn name(self) -> &'static str {
        match self {
            Digestion::Full => "full-digest",
            Digestion::Partial => "partial-digest",
            Digestion::NonSpecific => "non-specific-digest",
        }
    }
}

impl fmt::Display for Digestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Digestion {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "full-digest" | "full" => Ok(Digestion::Full),
            "partial-digest" | "partial" => Ok(Digestion::Partial),
            "non-specific-digest" | "non-specific" => Ok(Digestion::NonSpecific),
            _ => Err(ConstraintError::UnknownDigestion(s.to_string())),
        }
    }
}

/// A residue list that either permits (inclusion) or forbids (exclusion) a cleavage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidueRule {
    pub residues: Vec<u8>,
    pub for_inclusion: bool,
}

impl ResidueRule {
    pub fn inclusion(residues: &str) -> Self {
        Self {
            residues: residues.to_ascii_uppercase().into_bytes(),
            for_inclusion: true,
        }
    }

    pub fn exclusion(residues: &str) -> Self {
        Self {
            residues: residues.to_ascii_uppercase().into_bytes(),
            for_inclusion: false,
        }
    }

    /// A residue is legal if it is listed in an inclusion rule or absent from an exclusion rule.
    #[inline]
    pub fn permits(&self, residue: Option<u8>) -> bool {
        match residue {
            Some(r) if self.residues.contains(&r) => self.for_inclusion,
            _ => !self.for_inclusion,
        }
    }

    fn parse(token: &str) -> Result<Self, ConstraintError> {
        let invalid = || ConstraintError::InvalidCustomRule(token.to_string());
        let token = token.trim();
        let (body, for_inclusion) = if let Some(body) =
            token.strip_prefix('[').and_then(|t| t.strip_suffix(']'))
        {
            (body, true)
        } else if let Some(body) = token.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
            (body, false)
        } else {
            return Err(invalid());
        };
        if !body.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        // `[X]` is the conventional spelling of "any residue".
        if for_inclusion && body.eq_ignore_ascii_case("X") {
            return Ok(Self::exclusion(""));
        }
        Ok(Self {
            residues: body.to_ascii_uppercase().into_bytes(),
            for_inclusion,
        })
    }
}

/// Residue rules for a user-defined enzyme, checked independently on each side of the bond.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomResidueRules {
    pub pre: ResidueRule,
    pub post: ResidueRule,
}

impl CustomResidueRules {
    #[inline]
    pub fn permits(&self, pre: u8, post: Option<u8>) -> bool {
        self.pre.permits(Some(pre)) && self.post.permits(post)
    }
}

impl FromStr for CustomResidueRules {
    type Err = ConstraintError;

    /// Parses `PRE|POST`, where each side is `[..]` (inclusion) or `{..}` (exclusion),
    /// e.g. `[KR]|{P}` for trypsin.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pre, post) = s
            .split_once('|')
            .ok_or_else(|| ConstraintError::InvalidCustomRule(s.to_string()))?;
        Ok(Self {
            pre: ResidueRule::parse(pre)?,
            post: ResidueRule::parse(post)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trypsin_cleaves_after_k_or_r_unless_before_proline() {
        assert_eq!(Enzyme::Trypsin.cleaves(b'K', Some(b'A')), Some(true));
        assert_eq!(Enzyme::Trypsin.cleaves(b'R', None), Some(true));
        assert_eq!(Enzyme::Trypsin.cleaves(b'K', Some(b'P')), Some(false));
        assert_eq!(Enzyme::Trypsin.cleaves(b'A', Some(b'K')), Some(false));
    }

    #[test]
    fn aspn_cleaves_before_aspartate() {
        assert_eq!(Enzyme::AspN.cleaves(b'A', Some(b'D')), Some(true));
        assert_eq!(Enzyme::AspN.cleaves(b'D', Some(b'A')), Some(false));
        assert_eq!(Enzyme::AspN.cleaves(b'A', None), Some(false));
    }

    #[test]
    fn proline_insensitive_enzymes_ignore_following_residue() {
        assert_eq!(Enzyme::Clostripain.cleaves(b'R', Some(b'P')), Some(true));
        assert_eq!(Enzyme::CyanogenBromide.cleaves(b'M', Some(b'P')), Some(true));
        assert_eq!(Enzyme::StaphProtease.cleaves(b'E', None), Some(true));
    }

    #[test]
    fn custom_enzyme_defers_to_residue_rules() {
        assert_eq!(Enzyme::Custom.cleaves(b'K', None), None);
        let rules: CustomResidueRules = "[KR]|{P}".parse().unwrap();
        assert!(rules.permits(b'K', Some(b'A')));
        assert!(rules.permits(b'R', None));
        assert!(!rules.permits(b'K', Some(b'P')));
        assert!(!rules.permits(b'A', Some(b'G')));
    }

    #[test]
    fn custom_rule_x_means_any_residue() {
        let rules: CustomResidueRules = "[X]|[D]".parse().unwrap();
        assert!(rules.permits(b'A', Some(b'D')));
        assert!(!rules.permits(b'A', Some(b'E')));
    }

    #[test]
    fn malformed_custom_rules_are_rejected() {
        assert!("KR|P".parse::<CustomResidueRules>().is_err());
        assert!("[KR]".parse::<CustomResidueRules>().is_err());
        assert!("[K1]|{P}".parse::<CustomResidueRules>().is_err());
    }

    #[test]
    fn enzyme_and_digestion_names_round_trip() {
        for enzyme in Enzyme::ALL {
            assert_eq!(enzyme.name().parse::<Enzyme>().unwrap(), enzyme);
        }
        assert_eq!(
            "cyanogen_bromide".parse::<Enzyme>().unwrap(),
            Enzyme::CyanogenBromide
        );
        assert_eq!("partial".parse::<Digestion>().unwrap(), Digestion::Partial);
        assert!(matches!(
            "pepsin".parse::<Enzyme>(),
            Err(ConstraintError::UnknownEnzyme(_))
        ));
        assert!(matches!(
            "half".parse::<Digestion>(),
            Err(ConstraintError::UnknownDigestion(_))
        ));
    }
}
