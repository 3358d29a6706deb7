//! Built-in stages

pub mod cancellation;
pub mod logging;
pub mod recovery;
pub mod request_id;
pub mod timing;

pub use cancellation::CancellationStage;
pub use logging::AccessLogStage;
pub use recovery::RecoveryStage;
pub use request_id::{RequestIdStage, RequestIdStrategy};
pub use timing::TimingStage;
