// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 数据源、爬取、引擎、输出和公网IP查询的配置
pub mod settings;
