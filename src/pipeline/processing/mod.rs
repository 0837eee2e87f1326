// Pipeline phases, in execution order

pub mod canonicalize;
pub mod event_filter;
pub mod cas_match;
pub mod proprietary;
pub mod redundancy;
pub mod percent;
pub mod mass;

pub use canonicalize::Canonicalizer;
pub use cas_match::CasMatcher;
pub use event_filter::EventFilter;
pub use mass::MassApportioner;
pub use percent::PercentValidator;
pub use proprietary::ProprietaryClassifier;
pub use redundancy::RedundancyDetector;
