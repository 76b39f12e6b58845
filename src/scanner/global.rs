//! 全局扫描器单例管理
use once_cell::sync::Lazy;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::orchestrator::Scanner;
use super::renderer::HttpRenderer;
use crate::config::{ConfigManager, GlobalConfig};
use crate::error::{AuditError, AuditResult};
use crate::model::AnalysisResult;

/// 全局扫描器实例
static GLOBAL_SCANNER: Lazy<Arc<OnceCell<Scanner>>> = Lazy::new(|| Arc::new(OnceCell::new()));

/// 初始化全局扫描器（环境变量配置）
pub async fn init_scanner() -> AuditResult<()> {
    init_scanner_with_config(ConfigManager::from_env()).await
}

/// 带自定义配置初始化全局扫描器，渲染器为 HttpRenderer
pub async fn init_scanner_with_config(config: GlobalConfig) -> AuditResult<()> {
    if GLOBAL_SCANNER.get().is_some() {
        return Ok(());
    }

    let scanner = Scanner::new(config)?;
    let renderer = Arc::new(HttpRenderer::new(scanner.probe().clone()));
    // 并发初始化时以先完成者为准
    let _ = GLOBAL_SCANNER.set(scanner.with_renderer(renderer));

    Ok(())
}

/// 获取全局扫描器
pub(crate) fn get_global_scanner() -> AuditResult<&'static Scanner> {
    GLOBAL_SCANNER.get().ok_or(AuditError::ScannerNotInitialized)
}

/// 使用全局扫描器执行一次扫描
pub async fn scan(url: &str, language: &str) -> AuditResult<AnalysisResult> {
    get_global_scanner()?.run_scan(url, language).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_is_idempotent() {
        init_scanner_with_config(ConfigManager::get_default()).await.unwrap();
        init_scanner_with_config(ConfigManager::custom().max_links(1).build()).await.unwrap();
        assert_eq!(get_global_scanner().unwrap().config().max_links, 50);
    }
}
