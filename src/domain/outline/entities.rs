//! Outline Context - Entities

use serde::{Deserialize, Serialize};

/// 目录节点
///
/// 不变量:
/// - id 在整棵目录树内唯一
/// - 只有叶子节点（children 为空）承载生成的正文，容器节点只描述结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub children: Vec<OutlineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl OutlineItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            children: Vec::new(),
            content: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_children(mut self, children: Vec<OutlineItem>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn as_ref_item(&self) -> OutlineRef {
        OutlineRef {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }
}

/// 目录节点的轻量引用（不含子节点与正文），用于生成请求的上下文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineRef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// 章节生成上下文
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterContext {
    /// 从根到父节点的路径（根在前）
    pub parent_chapters: Vec<OutlineRef>,
    /// 与当前章节同一父节点下的全部章节（包含自身）
    pub sibling_chapters: Vec<OutlineRef>,
}
