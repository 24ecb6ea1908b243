//! GPU classification of instance type strings.

/// Substrings that mark an instance type as GPU enabled.
///
/// The bare `"p"` matches any type containing that letter anywhere, not just
/// the `p*` accelerated families. `ConfigValidator` warns when a type is
/// classified as GPU by that rule alone.
pub const GPU_MARKERS: &[&str] = &["p", "g5", "g4"];

/// Returns true if the instance type is GPU enabled.
///
/// Any string is accepted; there is no normalization or syntax check.
#[must_use]
pub fn classify(instance_type: &str) -> bool {
    GPU_MARKERS
        .iter()
        .any(|marker| instance_type.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_families() {
        assert!(classify("p3.2xlarge"));
        assert!(classify("p4d.24xlarge"));
        assert!(classify("g4dn.xlarge"));
        assert!(classify("g5.12xlarge"));
    }

    #[test]
    fn test_cpu_families() {
        assert!(!classify("c4.2xlarge"));
        assert!(!classify("m5.large"));
        assert!(!classify("t3.micro"));
        assert!(!classify("r6i.metal"));
    }

    #[test]
    fn test_substring_matches_anywhere() {
        assert!(classify("x2iedn.superlarge"));
        assert!(classify("p"));
        assert!(classify("abcg4"));
        assert!(!classify("G4DN.XLARGE"));
        assert!(!classify(""));
    }
}
