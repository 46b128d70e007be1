// Outreach: pitch generation and compliance checks.

pub mod compliance;
pub mod pitch;

pub use compliance::{check_compliance, ComplianceReport, MISSING_OPT_OUT, OPT_OUT_SENTENCE};
pub use pitch::{PitchGenerator, TemplatePitchGenerator};
