// Main rules module - delegates to semantic sub-modules
// - engine.rs: Rule, RuleKind and the ordered rule chain
// - section_detection.rs: heading classification and leading-title heuristic

pub mod engine;
pub mod section_detection;

pub use engine::{apply_rules, Rule, RuleKind};
pub use section_detection::{looks_like_leading_title, HeadingMatcher};
