//! Campus Shop Server - 校园商店订单/库存一致性服务
//!
//! # 架构概述
//!
//! 本模块是 Shop Server 的主入口，提供以下核心功能：
//!
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储 (商品、订单、通知)
//! - **库存对账** (`stock`): 标记门控的恰好一次扣减/回补与阈值告警
//! - **邮件派发** (`services/mailer`): 订单状态邮件与运营告警 (尽力而为)
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! shop-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── stock/         # 库存对账引擎、阈值告警
//! ├── services/      # 邮件派发
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 错误、日志、时间
//! └── db/            # 数据库层 (模型、仓储)
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod services;
pub mod stock;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use stock::{LOW_STOCK_THRESHOLD, StockService};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv, 工作目录, 日志)
///
/// 必须在 [`Config::from_env`] 之前调用，否则 .env 文件中的配置不生效。
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // .env 不存在不是错误
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = config.log_dir();
    init_logger_with_file(log_level.as_deref(), log_dir.to_str());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   _____
  / ___/ /_  ____  ____
  \__ \/ __ \/ __ \/ __ \
 ___/ / / / / /_/ / /_/ /
/____/_/ /_/\____/ .___/
                /_/
    "#
    );
}
