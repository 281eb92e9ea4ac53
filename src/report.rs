//! Downstream-facing result types and their text rendering.
//!
//! Field names (`entropy_shannon`, `entropy_renyi`, `entropy_tsallis`) and
//! the category spellings rendered by `Display` are a compatibility contract
//! with external CSV/report consumers.

use crate::cipher::{CipherTally, Classification};
use crate::entropy::EntropyVector;
use crate::flow::{FlowKey, Session};
use std::fmt;

/// Entropy fingerprint of one reconstructed flow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowEntropyRecord {
    pub flow: FlowKey,
    pub packets: usize,
    pub bytes: usize,
    pub entropy_shannon: f64,
    pub entropy_renyi: f64,
    pub entropy_tsallis: f64,
}

impl FlowEntropyRecord {
    pub fn new(session: &Session, entropy: EntropyVector) -> Self {
        FlowEntropyRecord {
            flow: session.key.clone(),
            packets: session.packets,
            bytes: session.payload.len(),
            entropy_shannon: entropy.shannon,
            entropy_renyi: entropy.renyi,
            entropy_tsallis: entropy.tsallis,
        }
    }
}

impl fmt::Display for FlowEntropyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} pkts, {} bytes] shannon={:.4} renyi={:.4} tsallis={:.4}",
            self.flow,
            self.packets,
            self.bytes,
            self.entropy_shannon,
            self.entropy_renyi,
            self.entropy_tsallis
        )
    }
}

/// Full characterization of one capture: per-flow entropy plus the
/// cipher-suite tally.
#[derive(Debug, Default)]
pub struct TrafficReport {
    /// Flows sorted by accumulated payload size, largest first.
    pub flows: Vec<FlowEntropyRecord>,
    pub ciphers: CipherTally,
}

impl fmt::Display for TrafficReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Flows ({}):", self.flows.len())?;
        for record in &self.flows {
            writeln!(f, "  {record}")?;
        }

        if self.ciphers.total() == 0 {
            writeln!(f, "\nNo cipher suites found in input.")?;
            return Ok(());
        }

        writeln!(f, "\nSummary of categories (occurrences):")?;
        for category in Classification::ALL {
            writeln!(f, "  {}: {}", category, self.ciphers.count_for(category))?;
        }

        // Unique codes by descending count, code as tie-break for stable
        // output.
        let mut codes: Vec<(&String, &u64)> = self.ciphers.code_counts.iter().collect();
        codes.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        writeln!(f, "\nFound {} unique cipher suites:", codes.len())?;
        for (code, count) in codes {
            writeln!(
                f,
                "  {code} : {} ({count} occurrences)",
                crate::cipher::classify(code)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::Taxonomy;
    use crate::flow::KeyMode;
    use crate::packet::PacketRecord;

    fn sample_session() -> Session {
        let record = PacketRecord {
            payload: Some(b"abcd".to_vec()),
            ..PacketRecord::default()
        };
        let sessions = crate::flow::aggregate(vec![record], KeyMode::Directional);
        sessions.into_values().next().unwrap()
    }

    #[test]
    fn test_flow_record_carries_session_stats() {
        let session = sample_session();
        let record = FlowEntropyRecord::new(&session, EntropyVector::of(&session.payload));
        assert_eq!(record.flow, FlowKey::Unknown);
        assert_eq!(record.packets, 1);
        assert_eq!(record.bytes, 4);
        assert!(record.entropy_shannon > 0.0);
    }

    #[test]
    fn test_report_renders_categories_in_fixed_order() {
        let taxonomy = Taxonomy::new();
        let mut report = TrafficReport::default();
        report.ciphers.observe(&taxonomy, "1301");
        report.ciphers.observe(&taxonomy, "ffff");

        let rendered = report.to_string();
        let secure = rendered.find("Secure: 1").unwrap();
        let unknown = rendered.find("Unknown: 1").unwrap();
        assert!(secure < unknown);
        assert!(rendered.contains("Found 2 unique cipher suites"));
    }

    #[test]
    fn test_report_without_ciphers_says_so() {
        let report = TrafficReport::default();
        assert!(report.to_string().contains("No cipher suites found"));
    }
}
