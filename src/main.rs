//! Hibiki - 规则式对话 TUI
//!
//! 入口：初始化日志、创建对话编排器与 TUI，并运行主循环。
//! 单线程运行时：查询与延迟都是同一线程上的挂起点。

use anyhow::Context;
use hibiki::{core::create_chat, observability, ui::run_app};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 全屏界面占用终端：仅在设置 HIBIKI_LOG 时把日志写入该文件
    if let Ok(path) = std::env::var("HIBIKI_LOG") {
        observability::init_to_file(&path)
            .with_context(|| format!("Failed to open log file {path}"))?;
    }

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);

    // 创建对话：返回命令发送端、状态接收端
    let (cmd_tx, state_rx) = create_chat(config_path)
        .await
        .context("Failed to create chat")?;

    run_app(state_rx, cmd_tx).await.context("App run failed")?;

    Ok(())
}
