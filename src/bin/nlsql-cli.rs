//! NLSQL 命令行客户端
//!
//! 非交互式 CLI：每条子命令对应仪表盘上的一个操作。
//! 会话（token、连接上下文、偏好设置）保存在本地 SQLite 中，多次调用之间共享。

use anyhow::Result;
use clap::{Parser, Subcommand};
use nlsql_client::dashboard::session::ConnectionContext;
use nlsql_client::dashboard::types::ChartType;
use nlsql_client::dashboard::views::{dashboard, export, health, ConnectForm, DbType};
use nlsql_client::{ClientConfig, DashboardClient, Route};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// NLSQL 命令行客户端
#[derive(Parser, Debug)]
#[command(name = "nlsql-cli")]
#[command(about = "NLSQL 命令行客户端 - 用自然语言查询已连接的数据库", long_about = None)]
struct Args {
    /// 后端 API 地址（包含 /api 前缀）
    #[arg(long, env = "NLSQL_API_BASE_URL", default_value = "http://localhost:8000/api")]
    api_base_url: String,

    /// 会话数据库 URL
    #[arg(long, env = "NLSQL_SESSION_DB", default_value = "sqlite://nlsql_session.db?mode=rwc")]
    session_db: String,

    /// 日志级别（默认: warn,nlsql_client=info）
    #[arg(long, default_value = "warn,nlsql_client=info")]
    log_level: String,

    /// 同时把日志追加写入该文件
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 账号密码登录
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// 注册账号并登录
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(short = 'n', long)]
        full_name: String,
    },
    /// 连接数据库
    Connect {
        /// postgresql / mysql / mongodb
        #[arg(long, default_value = "postgresql")]
        db_type: String,
        #[arg(long)]
        host: String,
        /// 默认使用驱动的默认端口
        #[arg(long)]
        port: Option<String>,
        #[arg(long)]
        database: String,
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// 用自然语言提问
    Ask {
        question: String,
        /// 把结果导出为 CSV 到该目录
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
    /// 当前租户的统计与最近查询
    Stats,
    /// 全局缓存统计
    CacheStats,
    /// 当前租户的查询历史
    History,
    /// 当前租户的 schema，可选拉取图表数据
    Schema {
        #[arg(long)]
        table: Option<String>,
        /// bar / line / pie
        #[arg(long)]
        chart: Option<String>,
    },
    /// 数据库健康状态
    Health,
    /// 断开数据库连接
    Disconnect,
    /// 登出
    Logout,
}

/// 初始化日志（stdout，可选追加到文件）
fn init_logger(log_level: &str, log_file: Option<&PathBuf>) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG，否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(true);

    let file_layer = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file)
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(false)
                    .with_ansi(false),
            ),
            Err(e) => {
                eprintln!("无法打开日志文件 {}: {}", path.display(), e);
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

fn parse_chart_type(raw: &str) -> Result<ChartType> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "bar" => Ok(ChartType::Bar),
        "line" => Ok(ChartType::Line),
        "pie" => Ok(ChartType::Pie),
        other => Err(anyhow::anyhow!("不支持的图表类型: {}", other)),
    }
}

async fn run(client: &DashboardClient, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let route = client.login(&email, &password).await?;
            println!("登录成功，下一步: {}", route.path());
        }
        Command::Register {
            email,
            password,
            full_name,
        } => {
            let route = client.register(&email, &password, &full_name).await?;
            println!("注册成功，下一步: {}", route.path());
        }
        Command::Connect {
            db_type,
            host,
            port,
            database,
            username,
            password,
        } => {
            let db_type: DbType = db_type.parse()?;
            let mut form = ConnectForm::new(db_type);
            form.host = host;
            if let Some(port) = port {
                form.port = port;
            }
            form.database = database;
            form.username = username;
            form.password = password;
            let (ctx, _) = client.connect(&form).await?;
            println!(
                "已连接 {} {}:{}/{}，tenant_id: {}",
                ctx.db_type, ctx.host, ctx.port, ctx.database_name, ctx.tenant_id
            );
        }
        Command::Ask {
            question,
            export_dir,
        } => {
            let mut view = client.ask_view().await?;
            view.set_question(question);
            view.submit().await;
            if let Some(result) = view.result() {
                println!("SQL: {}", export::copy_sql(result));
                println!(
                    "{} 行，耗时 {}{}",
                    result.row_count(),
                    result.execution_time,
                    if result.cached { "（缓存命中）" } else { "" }
                );
                match export::export_csv(result) {
                    Some(csv) => println!("{}", csv),
                    None => println!("（无数据）"),
                }
                if let Some(dir) = export_dir {
                    let path = export::write_csv(result, dir).await?;
                    println!("已导出: {}", path.display());
                }
            }
            if let Some(err) = view.error() {
                anyhow::bail!("{}", err);
            }
        }
        Command::Stats => {
            client.enter(Route::Dashboard).await?;
            let Some(snapshot) = dashboard::fetch_snapshot(client.api()).await? else {
                anyhow::bail!("尚未连接数据库，请先执行 connect");
            };
            println!("总查询数: {}", snapshot.total_queries);
            println!(
                "缓存命中率: {:.1}% ({})",
                snapshot.hit_rate_percentage,
                snapshot.verdict.label()
            );
            println!("平均延迟: {}", snapshot.avg_latency);
            for row in snapshot.recent_queries {
                println!("  [{}] {}", row.time, row.query);
            }
        }
        Command::CacheStats => {
            client.enter(Route::CacheAnalytics).await?;
            let stats = nlsql_client::dashboard::views::cache::fetch_cache_analytics(client.api())
                .await?;
            println!(
                "命中率: {:.1}%  命中: {}  未命中: {}  总请求: {}",
                stats.hit_rate_percentage, stats.hits, stats.misses, stats.total_requests
            );
            println!(
                "缓存后端: {}  内存缓存条目: {}",
                stats.backend_label(),
                stats.memory_cache_size
            );
        }
        Command::History => {
            client.enter(Route::Dashboard).await?;
            let tenant_id = require_tenant(client).await?;
            for item in client.api().get_tenant_history(&tenant_id).await? {
                println!(
                    "{}\t{}\t{}",
                    item.id,
                    dashboard::format_timestamp(&item.timestamp),
                    item.query
                );
            }
        }
        Command::Schema { table, chart } => {
            let mut view = client.insights_view().await?;
            if let Some(err) = view.error() {
                anyhow::bail!("加载 schema 失败: {}", err);
            }
            if let Some(table) = table {
                view.select_table(Some(table));
            }
            for name in view.table_names() {
                let marker = if Some(name) == view.selected_table() { "*" } else { " " };
                println!("{} {}", marker, name);
            }
            println!("列: {}", view.columns().join(", "));
            if let Some(chart) = chart {
                view.set_chart_type(parse_chart_type(&chart)?);
                match view.fetch_chart().await? {
                    Some(data) => {
                        for (x, y) in data.x.iter().zip(data.y.iter()) {
                            println!("{}\t{}", x, y);
                        }
                    }
                    None => warn!("[CLI] 选择不完整，未拉取图表数据"),
                }
            }
        }
        Command::Health => {
            let global = client.api().get_health().await?;
            println!("后端: {}", global.status);
            // 数据库状态只在已登录且已连接时可见
            client.enter(Route::Dashboard).await?;
            let reading = health::check(client.api(), client.config().slow_latency_threshold_ms).await;
            println!(
                "数据库: {} ({:.0} ms)",
                reading.status.as_str(),
                reading.latency_ms
            );
        }
        Command::Disconnect => {
            if client.disconnect().await? {
                println!("已断开数据库连接");
            } else {
                println!("当前没有数据库连接");
            }
        }
        Command::Logout => {
            client.logout().await?;
            println!("已登出");
        }
    }
    Ok(())
}

async fn require_tenant(client: &DashboardClient) -> Result<String> {
    ConnectionContext::tenant_id(client.store().as_ref())
        .await
        .ok_or_else(|| anyhow::anyhow!("尚未连接数据库，请先执行 connect"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level, args.log_file.as_ref());

    let mut config = ClientConfig::new(args.api_base_url);
    config.session_db_url = args.session_db;

    let client = DashboardClient::open(config).await?;
    if let Err(e) = run(&client, args.command).await {
        error!("[CLI] ❌ {}", e);
        return Err(e);
    }
    info!("[CLI] ✅ 完成");
    Ok(())
}
