//! KiotViet POS 适配器
//!
//! 通过 KiotViet Public API（OAuth2 client_credentials）读取单据 / 商品 / 客户等
//! 数据，并执行计划里的建档 / 修改 / 删除动作。

pub mod adapter;
pub mod client;
pub mod config;
pub mod mappers;

pub use adapter::KiotVietAdapter;
pub use client::{KiotVietClient, KiotVietError};
pub use config::KiotVietConfig;
