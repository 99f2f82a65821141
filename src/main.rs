//! Supervisor Notifier CLI
//!
//! supervisord eventlistener：进程状态变化 -> Slack 通知

use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::Parser;
use supervisor_notifier::cli::{ensure_supervisor_env, run_listener, ListenArgs};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "supernotify")]
#[command(about = "Supervisor eventlistener - 把进程状态变化发送到 Slack")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    listen: ListenArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    // stdout 是 supervisor 协议通道，日志只能写 stderr
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("supervisor_notifier=info,supernotify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let config = match cli.listen.validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = ensure_supervisor_env() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let pending = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&pending);
    // blocking HTTP 客户端必须在运行时线程之外创建和销毁
    let listener = tokio::task::spawn_blocking(move || run_listener(config, counter));

    tokio::select! {
        joined = listener => match joined {
            Ok(Ok(())) => ExitCode::SUCCESS,
            Ok(Err(e)) => {
                error!(error = %format!("{:#}", e), "Listener stopped");
                ExitCode::FAILURE
            }
            Err(e) => {
                error!(error = %e, "Listener thread panicked");
                ExitCode::FAILURE
            }
        },
        signal = shutdown_signal() => {
            info!(
                signal,
                discarded = pending.load(Ordering::Relaxed),
                "Received shutdown signal, pending events discarded"
            );
            // 阻塞线程仍停在 stdin 上，运行时无法正常回收，直接退出
            std::process::exit(0);
        }
    }
}

/// 等待 SIGINT / SIGTERM
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = tokio::signal::ctrl_c() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            },
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                "SIGINT"
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        "SIGINT"
    }
}
