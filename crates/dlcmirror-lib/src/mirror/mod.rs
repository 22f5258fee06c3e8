mod orchestrator;
mod report;

pub use orchestrator::{Discovery, Mirror, MirrorOptions};
pub use report::{MirrorReport, PhaseTally, SkippedFetch};
