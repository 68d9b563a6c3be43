pub mod classifier;
pub mod export;
pub mod feedback;
pub mod lookahead;
pub mod scanner;

pub use classifier::{CodeNormalizer, ScanClassifier, ScanKind};
pub use feedback::{BroadcastFeedback, FanoutFeedback, FeedbackSink, LogFeedback, StationEvent};
pub use scanner::ScanService;
