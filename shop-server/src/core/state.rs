//! 服务器状态 - 持有所有服务的共享引用
//!
//! ServerState 使用 Arc 实现浅拷贝，所有权成本极低。

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::Config;
use crate::db::DbService;
use crate::services::MailerService;
use crate::stock::StockService;
use crate::utils::AppError;

/// 服务器状态
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | mailer | Arc<MailerService> | 邮件派发服务 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 邮件派发服务 (Arc 共享所有权)
    pub mailer: Arc<MailerService>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/shop.db)
    /// 3. 邮件派发服务
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {e}")))?;

        let db_path = config.database_dir().join("shop.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;

        let mailer = Arc::new(MailerService::new(config));

        Ok(Self {
            config: config.clone(),
            db: db_service.db,
            mailer,
        })
    }

    /// 构造库存对账引擎
    pub fn stock_service(&self) -> StockService {
        StockService::new(self.db.clone(), self.mailer.clone())
    }
}
