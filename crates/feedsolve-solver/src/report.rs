//! Explanations attached to a failed solve.

use std::fmt;

use crate::candidate::SelectionCandidate;

/// Every candidate considered for an interface, with the reason it was not used.
#[derive(Debug, Default)]
pub struct RejectionReport {
    pub rejected: Vec<RejectedCandidate>,
}

#[derive(Debug, Clone)]
pub struct RejectedCandidate {
    pub interface: String,
    pub id: String,
    pub version: String,
    pub note: String,
}

impl RejectionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report on `candidates` for `interface`. Suitable candidates get
    /// `fallback_note`, since they only failed further down the graph.
    pub fn from_candidates(
        interface: &str,
        candidates: &[SelectionCandidate],
        fallback_note: &str,
    ) -> Self {
        let rejected = candidates
            .iter()
            .map(|c| RejectedCandidate {
                interface: interface.to_string(),
                id: c.id().to_string(),
                version: c.version().to_string(),
                note: if c.is_suitable() {
                    fallback_note.to_string()
                } else {
                    c.notes().to_string()
                },
            })
            .collect();
        Self { rejected }
    }

    pub fn add(&mut self, rejected: RejectedCandidate) {
        self.rejected.push(rejected);
    }

    pub fn is_empty(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rejected.len()
    }

    /// Text to append to a `NoSolution` error message.
    pub fn as_error_suffix(&self) -> String {
        format!(":\n{self}")
    }
}

impl fmt::Display for RejectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rejected.is_empty() {
            return write!(f, "No candidates were rejected.");
        }
        write!(f, "Rejected candidates ({}):", self.rejected.len())?;
        for r in &self.rejected {
            write!(f, "\n  {r}")?;
        }
        Ok(())
    }
}

impl fmt::Display for RejectedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}): {}",
            self.interface, self.version, self.id, self.note
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report() {
        let report = RejectionReport::new();
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
        assert_eq!(report.to_string(), "No candidates were rejected.");
    }

    #[test]
    fn report_with_rejections() {
        let mut report = RejectionReport::new();
        report.add(RejectedCandidate {
            interface: "http://example.com/app".to_string(),
            id: "sha1=abc".to_string(),
            version: "1.0".to_string(),
            note: "Marked as buggy".to_string(),
        });
        assert_eq!(report.len(), 1);
        let s = report.to_string();
        assert!(s.starts_with("Rejected candidates (1):"));
        assert!(s.contains("http://example.com/app 1.0 (sha1=abc): Marked as buggy"));
        assert!(report.as_error_suffix().starts_with(":\nRejected"));
    }
}
