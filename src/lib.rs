//! Tribus - 三合一 API 网关
//!
//! 一个轻量的 HTTP 代理服务，将请求转发给三个第三方 API，并把响应整理成简化的 JSON：
//!
//! - 对话 Agent 平台：创建会话 + 同步提问，按多条候选路径提取回答文本
//! - 数字人视频生成：创建视频任务、查询任务状态
//! - 产品分析平台：按时间范围获取 DAU / WAU / 留存 / 增长核算 insight
//!
//! 每个请求最多两次串行的上游调用，无状态、无缓存、无重试。

pub mod config;
pub mod daterange;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod upstream;
pub mod utils;

pub use config::Config;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{build_router, AppState};
