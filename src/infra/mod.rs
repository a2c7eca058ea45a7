//! 基础设施模块
//!
//! 封装外部依赖（SSM 客户端、摘要文件等）

pub mod executor;
pub mod ssm;
pub mod summary;

pub use executor::{ExecutorError, RemoteExecutor};
pub use ssm::SsmExecutor;
pub use summary::SummaryWriter;
