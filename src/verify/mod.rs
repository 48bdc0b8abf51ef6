//! School verification.
//!
//! Signup asks a [`SchoolVerifier`] whether the declared school is acceptable. The
//! default verifier only checks for institution keywords in the name; a registry-backed
//! verifier can be swapped in through [`crate::AppState`].

/// Keywords accepted by the default verifier.
pub const DEFAULT_SCHOOL_KEYWORDS: &[&str] = &[
    "school",
    "high",
    "academy",
    "college",
    "university",
    "institute",
    "education",
];

/// Decides whether a school name is acceptable for signup.
pub trait SchoolVerifier: Send + Sync {
    fn verify(&self, school_name: &str) -> bool;
}

/// Accepts any school whose name contains one of the configured keywords,
/// case-insensitively.
#[derive(Debug, Clone)]
pub struct KeywordVerifier {
    keywords: Vec<String>,
}

impl KeywordVerifier {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

impl Default for KeywordVerifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_SCHOOL_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        )
    }
}

impl SchoolVerifier for KeywordVerifier {
    fn verify(&self, school_name: &str) -> bool {
        let school = school_name.to_lowercase();
        self.keywords.iter().any(|k| school.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keywords() {
        let verifier = KeywordVerifier::default();
        assert!(verifier.verify("Springfield High"));
        assert!(verifier.verify("MIT - Massachusetts Institute of Technology"));
        assert!(verifier.verify("ROYAL ACADEMY"));
        assert!(!verifier.verify("Bob's Garage"));
        assert!(!verifier.verify(""));
    }

    #[test]
    fn test_custom_keywords() {
        let verifier = KeywordVerifier::new(vec!["Lyceum".to_string()]);
        assert!(verifier.verify("Athens lyceum"));
        assert!(!verifier.verify("Athens High School"));
    }
}
