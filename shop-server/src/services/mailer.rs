//! Status Notification Dispatcher
//!
//! 通过 HTTP JSON 把订单状态邮件 / 运营告警投递给外部邮件中继。
//! Fire-and-forget：所有失败只记 warn 日志，绝不向核心流程传播。
//! 未配置 `MAIL_API_URL` 时为空操作 (测试即走此路径)。

use std::time::Duration;

use crate::core::Config;
use crate::db::models::{Order, OrderStatus};

/// 邮件中继客户端
pub struct MailerService {
    client: reqwest::Client,
    api_url: Option<String>,
    from: String,
    admin_email: String,
}

impl MailerService {
    /// Build from server config
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            api_url: config.mail_api_url.clone(),
            from: config.mail_from.clone(),
            admin_email: config.admin_email.clone(),
        }
    }

    /// No-op dispatcher (tests, relay not configured)
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: None,
            from: String::new(),
            admin_email: String::new(),
        }
    }

    /// 客户订单状态邮件 (确认/待取/完成/取消)
    pub async fn send_order_status_email(&self, order: &Order, new_status: OrderStatus) {
        let order_id = order
            .id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default();

        let payload = serde_json::json!({
            "from": self.from,
            "to": order.customer_email,
            "recipient_name": order.customer_name,
            "template": "order_status",
            "fields": {
                "product_name": order.product_name,
                "status": new_status.to_string(),
                "order_id": order_id,
                "quantity": order.quantity,
                "total_amount": order.total_amount,
            },
        });

        self.post("order status email", payload).await;
    }

    /// 运营告警邮件 (新订单 / 库存越界)
    pub async fn send_admin_notification(
        &self,
        title: &str,
        body: &str,
        fields: serde_json::Value,
    ) {
        let payload = serde_json::json!({
            "from": self.from,
            "to": self.admin_email,
            "template": "admin_notification",
            "subject": title,
            "body": body,
            "fields": fields,
        });

        self.post("admin notification", payload).await;
    }

    async fn post(&self, kind: &str, payload: serde_json::Value) {
        let Some(url) = &self.api_url else {
            tracing::debug!(kind, "Mail relay not configured, skipping dispatch");
            return;
        };

        let resp = match self.client.post(url).json(&payload).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(kind, error = %e, "Failed to reach mail relay");
                return;
            }
        };

        if !resp.status().is_success() {
            tracing::warn!(
                kind,
                status = %resp.status(),
                "Mail relay returned non-success status"
            );
            return;
        }

        tracing::debug!(kind, "Mail dispatched");
    }
}
