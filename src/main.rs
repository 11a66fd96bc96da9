//! Bidwriter - 标书编写客户端
//!
//! 组装顺序: 配置 → 日志 → Sled 本地存储 → 事件发布器 → 会话 → API 客户端 → 命令处理器

mod cli;

use anyhow::Context;
use clap::Parser;
use futures_util::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use bidwriter::application::{
    ApplyOutlineCommand, ApplyOutlineHandler, AuthSession, ClientEvent, CompareChapterVersions,
    CompareChapterVersionsHandler, DraftCache, GenerateChapterContentsCommand,
    GenerateChapterContentsHandler, StreamEvent,
};
use bidwriter::config::{load_config_from_path, print_config, AppConfig, LogConfig};
use bidwriter::domain::Outline;
use bidwriter::infrastructure::http::dto::CreateCommentRequest;
use bidwriter::infrastructure::{ApiClient, EventPublisher, SledKeyValueStore};
use cli::{Cli, Command, CommentCommand, ProjectCommand};

/// 每个流式分片都会产生一条 ChapterProgress，容量按 5 路并发留足余量
const CLI_EVENT_CAPACITY: usize = 4096;

/// 一次命令执行所需的全部组件
struct App {
    config: AppConfig,
    client: Arc<ApiClient>,
    drafts: Arc<DraftCache>,
    events: Arc<EventPublisher>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config_from_path(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);
    print_config(&config);

    tokio::fs::create_dir_all(&config.storage.data_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.storage.data_dir.display()))?;

    let store = SledKeyValueStore::open(config.storage.db_path())?.arc();
    let events = EventPublisher::with_capacity(CLI_EVENT_CAPACITY).arc();
    let session = AuthSession::restore(store.clone(), events.clone()).arc();
    let client = ApiClient::new(config.api.client_config(), session)?.arc();
    let drafts = Arc::new(DraftCache::new(store.clone()));

    let app = App {
        config,
        client,
        drafts,
        events,
    };

    let mut rx = app.events.subscribe();
    let result = run(&app, cli.command, &mut rx).await;

    // 命令结束后补打未消费的事件（例如 LoginRequired）
    drain_events(&mut rx);
    store.flush()?;

    result
}

fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("warn,bidwriter={}", log.level))
    });

    if log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run(app: &App, command: Command, rx: &mut broadcast::Receiver<ClientEvent>) -> anyhow::Result<()> {
    let client = &app.client;

    match command {
        Command::Login { username, password } => {
            let user = client.login(&username, &password).await?;
            println!("已登录: {} <{}> ({})", user.username, user.email, user.role);
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let user = client.register(&username, &email, &password).await?;
            println!("注册成功: {} <{}>", user.username, user.email);
        }
        Command::Logout => {
            client.logout()?;
            println!("已登出，本地凭据与草稿已清理");
        }
        Command::Whoami => {
            let user = client.me().await?;
            println!("{} <{}> role={} id={}", user.username, user.email, user.role, user.id);
        }
        Command::Projects(command) => run_project_command(client, command).await?,
        Command::Upload { document, out } => {
            let uploaded = client.upload_document(&document).await?;
            let text = uploaded.file_content.unwrap_or_default();
            tokio::fs::write(&out, &text)
                .await
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("{}，提取文本 {} 字，已保存到 {}", uploaded.message, text.chars().count(), out.display());
        }
        Command::Outline(args) => {
            let overview = match (&args.document, &args.overview) {
                (Some(document), _) => client
                    .upload_document(document)
                    .await?
                    .file_content
                    .context("文档未返回可用文本")?,
                (None, Some(path)) => read_text(path).await?,
                (None, None) => anyhow::bail!("需要 --overview 或 --document"),
            };
            let requirements = read_text(&args.requirements).await?;
            let request = bidwriter::infrastructure::http::dto::OutlineRequest {
                overview,
                requirements,
            };

            let mut stream = client.generate_outline_stream(&request).await?;
            let mut text = None;
            while let Some(event) = stream.next().await {
                match event? {
                    StreamEvent::Partial(partial) => eprint!("\r已接收 {} 字", partial.chars().count()),
                    StreamEvent::Complete(full) => text = Some(full),
                    StreamEvent::Error(message) => anyhow::bail!("目录生成失败: {}", message),
                }
            }
            eprintln!();
            let text = text.context("目录生成未返回结果")?;
            let outline = Outline::from_json(&text)?;

            let applied = ApplyOutlineHandler::new(app.drafts.clone())
                .handle(ApplyOutlineCommand { outline })?;
            write_outline(&args.out, &applied.outline).await?;
            println!(
                "目录已保存到 {}，叶子章节 {} 个，恢复草稿 {} 个",
                args.out.display(),
                applied.outline.collect_leaf_items().len(),
                applied.restored
            );
        }
        Command::Generate(args) => {
            let outline = Outline::from_json(&read_text(&args.outline).await?)?;
            let project_overview = read_text(&args.overview).await?;

            // 先与本地草稿对账，失败的章节仍保留上次的草稿
            let applied = ApplyOutlineHandler::new(app.drafts.clone())
                .handle(ApplyOutlineCommand { outline })?;

            let handler = GenerateChapterContentsHandler::new(
                client.clone(),
                app.drafts.clone(),
                app.events.clone(),
            )
            .with_max_concurrent(app.config.generation.max_concurrent);

            let generation = handler.handle(GenerateChapterContentsCommand {
                outline: applied.outline,
                project_overview,
            });
            tokio::pin!(generation);

            let response = loop {
                tokio::select! {
                    result = &mut generation => break result?,
                    event = rx.recv() => on_received(event),
                }
            };
            drain_events(rx);

            let out = args.out.as_deref().unwrap_or(&args.outline);
            write_outline(out, &response.outline).await?;
            println!(
                "生成完成: 成功 {} / 共 {}，结果已保存到 {}",
                response.succeeded(),
                response.progress.total,
                out.display()
            );
            if !response.progress.failed.is_empty() {
                println!("以下章节生成失败: {}", response.progress.failed.join("、"));
            }
        }
        Command::Proofread { chapter_id } => {
            let mut stream = client.proofread_stream(chapter_id).await?;
            while let Some(event) = stream.next().await {
                match event? {
                    StreamEvent::Partial(partial) => eprint!("\r校对中 {} 字", partial.chars().count()),
                    StreamEvent::Complete(result) => {
                        eprintln!();
                        println!("{}", result.summary);
                        println!("问题 {} 个，其中严重 {} 个", result.issues.len(), result.critical_count());
                        for issue in &result.issues {
                            println!(
                                "[{:?}/{:?}] {}: {}\n    建议: {}",
                                issue.severity, issue.category, issue.position, issue.issue, issue.suggestion
                            );
                        }
                    }
                    StreamEvent::Error(message) => anyhow::bail!("校对失败: {}", message),
                }
            }
        }
        Command::Consistency { project_id } => {
            let report = client.check_consistency(project_id).await?;
            println!("{} ({})", report.summary, report.overall_consistency);
            for item in &report.contradictions {
                println!(
                    "[{:?}/{:?}] {}\n    {}: {}\n    {}: {}\n    建议: {}",
                    item.severity,
                    item.category,
                    item.description,
                    item.chapter_a,
                    item.detail_a,
                    item.chapter_b,
                    item.detail_b,
                    item.suggestion
                );
            }
        }
        Command::Versions { project_id } => {
            let versions = client.list_versions(project_id).await?;
            for v in &versions.items {
                println!(
                    "v{:<4} {} {:?} {}",
                    v.version_number,
                    v.id,
                    v.change_type,
                    v.change_summary.as_deref().unwrap_or("")
                );
            }
            println!("共 {} 个版本", versions.total);
        }
        Command::Diff {
            project_id,
            old_version,
            new_version,
            chapter,
        } => {
            let handler = CompareChapterVersionsHandler::new(client.clone());
            let diff = handler
                .handle(CompareChapterVersions {
                    project_id,
                    old_version_id: old_version,
                    new_version_id: new_version,
                    chapter_id: chapter,
                })
                .await?;

            println!("v{} → v{}", diff.old_version_number, diff.new_version_number);
            if !diff.view.has_changes() {
                println!("内容相同");
            }
            for line in &diff.view.lines {
                println!("{} {}", line.kind.marker(), line.text);
            }
            if diff.view.hidden_count > 0 {
                println!("... 还有 {} 行未显示", diff.view.hidden_count);
            }
        }
        Command::Rollback {
            project_id,
            version_id,
            no_snapshot,
        } => {
            let outcome = client.rollback_version(project_id, version_id, !no_snapshot).await?;
            println!(
                "已回滚到 v{}，新版本 v{}，恢复章节 {} 个",
                outcome.target_version_number.unwrap_or_default(),
                outcome.new_version_number.unwrap_or_default(),
                outcome.restored_chapters.len()
            );
        }
        Command::Snapshot { project_id, summary } => {
            let version = client.create_snapshot(project_id, summary.as_deref()).await?;
            println!("已创建快照 v{} ({})", version.version_number, version.id);
        }
        Command::Comments(command) => run_comment_command(client, command).await?,
        Command::Export(args) => {
            let outline = Outline::from_json(&read_text(&args.outline).await?)?;
            let overview = match &args.overview {
                Some(path) => read_text(path).await?,
                None => String::new(),
            };
            let bytes = client.export_word(&args.name, &overview, &outline).await?;
            tokio::fs::write(&args.out, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", args.out.display()))?;
            println!("已导出 {} ({} 字节)", args.out.display(), bytes.len());
        }
    }

    Ok(())
}

async fn run_project_command(client: &ApiClient, command: ProjectCommand) -> anyhow::Result<()> {
    match command {
        ProjectCommand::List => {
            for project in client.list_projects().await? {
                println!("{} {:?} {}", project.id, project.status, project.name);
            }
        }
        ProjectCommand::Show { project_id } => {
            let project = client.get_project(project_id).await?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectCommand::Create { name, description } => {
            let project = client.create_project(&name, description).await?;
            println!("已创建项目 {} ({})", project.name, project.id);
        }
        ProjectCommand::Delete { project_id } => {
            client.delete_project(project_id).await?;
            println!("已删除项目 {}", project_id);
        }
        ProjectCommand::Progress { project_id } => {
            let p = client.project_progress(project_id).await?;
            println!(
                "共 {} 章: 待生成 {}，已生成 {}，审核中 {}，已定稿 {}，完成度 {:.1}%",
                p.total_chapters, p.pending, p.generated, p.reviewing, p.finalized, p.completion_percentage
            );
        }
        ProjectCommand::Members { project_id } => {
            for member in client.list_members(project_id).await? {
                println!("{} {:?} {} <{}>", member.user_id, member.role, member.username, member.email);
            }
        }
    }
    Ok(())
}

async fn run_comment_command(client: &ApiClient, command: CommentCommand) -> anyhow::Result<()> {
    match command {
        CommentCommand::List { chapter_id } => {
            let comments = client.list_comments(chapter_id).await?;
            for c in &comments.items {
                let mark = if c.is_resolved { "✓" } else { " " };
                println!("[{}] {} {}: {}", mark, c.id, c.username, c.content);
            }
            println!("共 {} 条批注", comments.total);
        }
        CommentCommand::Add {
            chapter_id,
            content,
            start,
            end,
        } => {
            let comment = client
                .create_comment(
                    chapter_id,
                    CreateCommentRequest {
                        content,
                        position_start: start,
                        position_end: end,
                    },
                )
                .await?;
            println!("已添加批注 {}", comment.id);
        }
        CommentCommand::Resolve { comment_id } => {
            client.resolve_comment(comment_id).await?;
            println!("批注 {} 已解决", comment_id);
        }
        CommentCommand::Delete { comment_id } => {
            client.delete_comment(comment_id).await?;
            println!("批注 {} 已删除", comment_id);
        }
    }
    Ok(())
}

fn on_received(event: Result<ClientEvent, RecvError>) {
    match event {
        Ok(event) => render_event(&event),
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "Event output lagged, some chapter events were dropped")
        }
        Err(RecvError::Closed) => {}
    }
}

/// 输出通道中剩余的事件，返回因滞后被丢弃的条数
fn drain_events(rx: &mut broadcast::Receiver<ClientEvent>) -> u64 {
    let mut dropped = 0;
    loop {
        match rx.try_recv() {
            Ok(event) => render_event(&event),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event output lagged, some chapter events were dropped");
                dropped += skipped;
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return dropped,
        }
    }
}

fn render_event(event: &ClientEvent) {
    match event {
        ClientEvent::ChapterStarted { chapter_id } => eprintln!("→ {} 开始生成", chapter_id),
        ClientEvent::ChapterProgress { .. } => {}
        ClientEvent::ChapterCompleted { chapter_id } => eprintln!("✓ {} 完成", chapter_id),
        ClientEvent::ChapterFailed {
            chapter_id,
            title,
            error,
        } => eprintln!("✗ {} {} 失败: {}", chapter_id, title, error),
        ClientEvent::GenerationFinished { progress } => {
            eprintln!("进度 {}/{}", progress.completed, progress.total)
        }
        ClientEvent::LoginRequired => eprintln!("登录已失效，请重新执行 bidwriter login"),
    }
}

async fn read_text(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn write_outline(path: &Path, outline: &Outline) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(outline)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
