//! 命令行定义

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "bidwriter", version, about = "标书编写客户端")]
pub struct Cli {
    /// 配置文件路径（默认搜索 bidwriter.toml / bidwriter.local.toml）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 登录（用户名或邮箱）
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "BIDWRITER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// 注册新用户
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "BIDWRITER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// 登出并清理本地凭据与草稿
    Logout,
    /// 当前用户
    Whoami,
    /// 项目管理
    #[command(subcommand)]
    Projects(ProjectCommand),
    /// 上传招标文件（PDF / docx），保存提取的文本
    Upload {
        document: PathBuf,
        /// 提取文本的输出路径
        #[arg(long, default_value = "overview.txt")]
        out: PathBuf,
    },
    /// 生成目录并与本地草稿对账
    Outline(OutlineArgs),
    /// 为目录中全部叶子章节生成正文
    Generate(GenerateArgs),
    /// 流式校对章节
    Proofread { chapter_id: Uuid },
    /// 跨章节一致性检查
    Consistency { project_id: Uuid },
    /// 版本列表
    Versions { project_id: Uuid },
    /// 对比两个版本中的章节正文
    Diff {
        project_id: Uuid,
        old_version: Uuid,
        new_version: Uuid,
        /// 项目快照中的章节 ID
        #[arg(long)]
        chapter: Option<String>,
    },
    /// 回滚到指定版本
    Rollback {
        project_id: Uuid,
        version_id: Uuid,
        /// 回滚前不保存当前状态
        #[arg(long)]
        no_snapshot: bool,
    },
    /// 手动创建项目快照
    Snapshot {
        project_id: Uuid,
        #[arg(long)]
        summary: Option<String>,
    },
    /// 章节批注
    #[command(subcommand)]
    Comments(CommentCommand),
    /// 导出 Word 文档
    Export(ExportArgs),
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    List,
    Show { project_id: Uuid },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { project_id: Uuid },
    Progress { project_id: Uuid },
    Members { project_id: Uuid },
}

#[derive(Debug, Args)]
pub struct OutlineArgs {
    /// 项目概述文本文件
    #[arg(long, required_unless_present = "document", conflicts_with = "document")]
    pub overview: Option<PathBuf>,
    /// 招标文件（PDF / docx），上传后以提取的文本作为项目概述
    #[arg(long)]
    pub document: Option<PathBuf>,
    /// 技术评分要求文本文件
    #[arg(long)]
    pub requirements: PathBuf,
    /// 目录 JSON 输出路径
    #[arg(long, default_value = "outline.json")]
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// 目录 JSON
    #[arg(long, default_value = "outline.json")]
    pub outline: PathBuf,
    /// 项目概述文本文件
    #[arg(long)]
    pub overview: PathBuf,
    /// 含正文的目录 JSON 输出路径，默认覆盖输入
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CommentCommand {
    List { chapter_id: Uuid },
    Add {
        chapter_id: Uuid,
        content: String,
        #[arg(long)]
        start: Option<u32>,
        #[arg(long)]
        end: Option<u32>,
    },
    Resolve { comment_id: Uuid },
    Delete { comment_id: Uuid },
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// 含正文的目录 JSON
    #[arg(long, default_value = "outline.json")]
    pub outline: PathBuf,
    #[arg(long)]
    pub name: String,
    /// 项目概述文本文件
    #[arg(long)]
    pub overview: Option<PathBuf>,
    #[arg(long, default_value = "标书.docx")]
    pub out: PathBuf,
}
