pub mod aggregator;
pub mod analysis;
pub mod chart;
pub mod ingest;
pub mod preview;
pub mod schema;
pub mod session;
pub mod summarizer;
