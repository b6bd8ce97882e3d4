//! # img-master — 应用入口
//!
//! 本文件仅负责日志初始化、参数解析与退出码映射。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::process::ExitCode;

use clap::Parser;
use img_master::cli::{self, CliArgs};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("❌ [{}] {}", e.code(), e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
