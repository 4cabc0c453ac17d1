mod feature_gate;

pub use feature_gate::{FeatureGateFactory, FeatureGateService, Gate};
