use serde::{Deserialize, Serialize};

/// Audit record for a sentence that triggered a rule.
///
/// `text` is the sentence as it was when the rule fired, before that rule
/// transformed it. Serialized as `{"bucket", "rule", "text"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub bucket: String,
    #[serde(rename = "rule")]
    pub rule_name: String,
    pub text: String,
}

impl Match {
    pub fn new(rule_name: &str, bucket: &str, text: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            rule_name: rule_name.to_string(),
            text: text.to_string(),
        }
    }
}

/// Output of one cleaning run.
///
/// Each entry of `lines` is one cleaned paragraph. Downstream consumers treat
/// a line as an atomic unit and never split it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanResult {
    pub lines: Vec<String>,
    pub extracted: Vec<Match>,
}

impl CleanResult {
    /// Match counts grouped by bucket, in order of first appearance.
    pub fn bucket_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for m in &self.extracted {
            match counts.iter_mut().find(|(bucket, _)| *bucket == m.bucket) {
                Some(entry) => entry.1 += 1,
                None => counts.push((m.bucket.clone(), 1)),
            }
        }
        counts
    }
}

/// Captured intermediate outputs from each pipeline stage.
/// Used for diagnostics: lets you inspect what each boundary produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStages {
    pub preprocessor: String,
    pub raw_text: String,
    pub normalized_text: String,
    pub result: CleanResult,
    /// Per-stage wall time in milliseconds; empty unless profiling was on.
    pub timings_ms: Vec<(String, u64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_serializes_with_rule_key() {
        let m = Match::new("ad", "solicitation", "关注公众号");
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(
            json,
            r#"{"bucket":"solicitation","rule":"ad","text":"关注公众号"}"#
        );
    }

    #[test]
    fn test_bucket_counts_keep_first_seen_order() {
        let result = CleanResult {
            lines: vec![],
            extracted: vec![
                Match::new("a", "noise", "x"),
                Match::new("b", "solicitation", "y"),
                Match::new("c", "noise", "z"),
            ],
        };
        assert_eq!(
            result.bucket_counts(),
            vec![("noise".to_string(), 2), ("solicitation".to_string(), 1)]
        );
    }
}
