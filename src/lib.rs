// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 省份、区县和逐小时天气记录，以及遍历与提取服务
pub mod domain;

/// 引擎模块
///
/// 抓取引擎和浏览器会话
pub mod engines;

/// 基础设施模块
///
/// CSV存储、公网IP查询和指标
pub mod infrastructure;

/// 工具模块
///
/// 错误类型、重试策略和日志初始化
pub mod utils;

/// 工作器模块
///
/// 爬取流程编排
pub mod workers;
