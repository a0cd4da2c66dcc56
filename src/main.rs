use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use urdu_translation_service::api_constants::remote_config;
use urdu_translation_service::config::Cli;
use urdu_translation_service::server::{build_router, AppState};
use urdu_translation_service::translator::AutoTranslator;
use urdu_translation_service::utils::{init_logging, validate_remote_page_url};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    // 远程页面地址是编译期常量，启动时仍做一次完整性校验
    validate_remote_page_url(remote_config::TRANSLATE_PAGE_URL)
        .context("远程翻译页面地址无效")?;

    let config = cli.to_service_config();

    if !cli.quiet {
        info!("🚀 启动英语→乌尔都语翻译服务");
        info!("📂 词表文件: {}", config.mapping_path().display());
        info!("🌐 远程页面: {}", remote_config::TRANSLATE_PAGE_URL);
        info!(
            "🖥️  浏览器模式: {}",
            if config.is_headless() { "无头" } else { "有头" }
        );
    }

    // 浏览器会话推迟到首个翻译请求时创建
    let headless = config.is_headless();
    let translator = AutoTranslator::new(&config);
    let stats = translator.stats();
    let state = Arc::new(AppState::new(translator, headless));
    let router = build_router(state.clone());

    let bind_addr = format!("{}:{}", config.host(), config.port());
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("❌ 监听地址绑定失败 [{}]: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    info!("✅ 服务已启动: http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP服务运行失败")?;

    // 退出前释放浏览器会话
    state.translator.close().await;
    stats.log_summary();
    info!("👋 服务已退出");

    Ok(())
}

/// 等待Ctrl-C退出信号
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("退出信号监听失败: {}", e);
        return;
    }
    info!("🛑 收到退出信号，开始优雅关闭");
}
