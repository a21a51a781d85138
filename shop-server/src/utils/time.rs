//! 时间工具函数
//!
//! 所有时间戳统一为 Unix millis，repository 层只接收 `i64`。

/// 当前时间的 Unix millis
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
