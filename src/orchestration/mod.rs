pub mod analyzer;

pub use analyzer::{AnalysisError, Analyzer, ModeComparison, ModeOutcome, PositionReport};
