//! 领域模型模块
//!
//! 纯数据结构，不依赖 AWS SDK / tokio

pub mod deploy;

// Re-exports for convenience
pub use deploy::{
    CommandId, DispatchReport, InvocationOutput, InvocationStatus, SendCommandRequest,
};
