//! 服务层 - 外部协作方
//!
//! # 服务列表
//!
//! - [`MailerService`] - 邮件中继派发 (订单状态邮件 / 运营告警)

pub mod mailer;

pub use mailer::MailerService;
