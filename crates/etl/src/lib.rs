//! # ETL - 周度特征矩阵
//!
//! 为股票方向预测构建特征矩阵
//!
//! ## 功能
//!
//! - 下载行情并计算收益率、波动率与技术指标
//! - 文本清洗、情感打分与周度聚合
//! - 按日期对齐拼装，滞后一期生成标签
//! - CSV 读写与训练集加载

pub mod aggregation;
pub mod assembler;
pub mod cleansing;
pub mod pipeline;
pub mod scraper;
pub mod sentiment;
pub mod storage;
pub mod types;

pub use pipeline::{FeaturePipeline, FeaturePipelineBuilder};
pub use storage::Storage;
pub use types::{
    ETLError, ETLResult, PipelineConfig, SentimentRecord, TextRecord, TextSource, WeeklySentiment,
};
