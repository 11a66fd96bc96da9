//! Outline Context - Aggregate

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{ChapterContext, OutlineError, OutlineItem};

/// 目录聚合根
///
/// 顶层条目互为同级章节，没有上级。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outline {
    items: Vec<OutlineItem>,
}

impl Outline {
    /// 创建目录，校验 ID 非空且全树唯一
    pub fn new(items: Vec<OutlineItem>) -> Result<Self, OutlineError> {
        let outline = Self { items };
        outline.validate()?;
        Ok(outline)
    }

    /// 从 AI 返回的 JSON 文本解析目录
    ///
    /// 接受 `{"outline": [...]}` 或直接的数组
    pub fn from_json(text: &str) -> Result<Self, OutlineError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Wrapped { outline: Vec<OutlineItem> },
            Bare(Vec<OutlineItem>),
        }

        let wire: Wire = serde_json::from_str(text.trim())
            .map_err(|e| OutlineError::Parse(e.to_string()))?;
        let items = match wire {
            Wire::Wrapped { outline } => outline,
            Wire::Bare(items) => items,
        };
        Self::new(items)
    }

    pub fn items(&self) -> &[OutlineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn validate(&self) -> Result<(), OutlineError> {
        fn walk(items: &[OutlineItem], seen: &mut HashSet<String>) -> Result<(), OutlineError> {
            for item in items {
                if item.id.trim().is_empty() {
                    return Err(OutlineError::EmptyId);
                }
                if !seen.insert(item.id.clone()) {
                    return Err(OutlineError::DuplicateId(item.id.clone()));
                }
                walk(&item.children, seen)?;
            }
            Ok(())
        }

        walk(&self.items, &mut HashSet::new())
    }

    /// 收集所有叶子章节（深度优先、从左到右）
    pub fn collect_leaf_items(&self) -> Vec<&OutlineItem> {
        fn walk<'a>(items: &'a [OutlineItem], out: &mut Vec<&'a OutlineItem>) {
            for item in items {
                if item.is_leaf() {
                    out.push(item);
                } else {
                    walk(&item.children, out);
                }
            }
        }

        let mut leaves = Vec::new();
        walk(&self.items, &mut leaves);
        leaves
    }

    pub fn leaf_ids(&self) -> HashSet<String> {
        self.collect_leaf_items()
            .into_iter()
            .map(|item| item.id.clone())
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&OutlineItem> {
        fn walk<'a>(items: &'a [OutlineItem], id: &str) -> Option<&'a OutlineItem> {
            for item in items {
                if item.id == id {
                    return Some(item);
                }
                if let Some(found) = walk(&item.children, id) {
                    return Some(found);
                }
            }
            None
        }

        walk(&self.items, id)
    }

    /// 解析章节的上级链与同级章节
    pub fn context_for(&self, id: &str) -> Option<ChapterContext> {
        fn locate<'a>(
            siblings: &'a [OutlineItem],
            id: &str,
            path: &mut Vec<&'a OutlineItem>,
        ) -> Option<&'a [OutlineItem]> {
            for item in siblings {
                if item.id == id {
                    return Some(siblings);
                }
                path.push(item);
                if let Some(found) = locate(&item.children, id, path) {
                    return Some(found);
                }
                path.pop();
            }
            None
        }

        let mut path = Vec::new();
        let siblings = locate(&self.items, id, &mut path)?;

        Some(ChapterContext {
            parent_chapters: path.iter().map(|item| item.as_ref_item()).collect(),
            sibling_chapters: siblings.iter().map(OutlineItem::as_ref_item).collect(),
        })
    }

    /// 整体替换叶子章节的正文
    pub fn set_content(&mut self, id: &str, content: impl Into<String>) -> Result<(), OutlineError> {
        fn walk<'a>(items: &'a mut [OutlineItem], id: &str) -> Option<&'a mut OutlineItem> {
            for item in items.iter_mut() {
                if item.id == id {
                    return Some(item);
                }
                if let Some(found) = walk(&mut item.children, id) {
                    return Some(found);
                }
            }
            None
        }

        let item = walk(&mut self.items, id).ok_or_else(|| OutlineError::NotFound(id.to_string()))?;
        if !item.is_leaf() {
            return Err(OutlineError::NotALeaf(id.to_string()));
        }
        item.content = Some(content.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Outline {
        Outline::new(vec![
            OutlineItem::new("1", "技术方案").with_children(vec![
                OutlineItem::new("1.1", "总体设计"),
                OutlineItem::new("1.2", "详细设计").with_children(vec![
                    OutlineItem::new("1.2.1", "模块 A"),
                    OutlineItem::new("1.2.2", "模块 B"),
                ]),
            ]),
            OutlineItem::new("2", "服务承诺"),
        ])
        .unwrap()
    }

    #[test]
    fn test_collect_leaf_items_depth_first() {
        let outline = sample();
        let ids: Vec<&str> = outline
            .collect_leaf_items()
            .iter()
            .map(|item| item.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1.1", "1.2.1", "1.2.2", "2"]);
    }

    #[test]
    fn test_leaf_ids_excludes_containers() {
        let ids = sample().leaf_ids();
        assert_eq!(ids.len(), 4);
        assert!(!ids.contains("1"));
        assert!(!ids.contains("1.2"));
    }

    #[test]
    fn test_context_for_nested_leaf() {
        let ctx = sample().context_for("1.2.2").unwrap();
        let parents: Vec<&str> = ctx.parent_chapters.iter().map(|p| p.id.as_str()).collect();
        let siblings: Vec<&str> = ctx.sibling_chapters.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(parents, vec!["1", "1.2"]);
        assert_eq!(siblings, vec!["1.2.1", "1.2.2"]);
    }

    #[test]
    fn test_context_for_top_level() {
        let ctx = sample().context_for("2").unwrap();
        assert!(ctx.parent_chapters.is_empty());
        assert_eq!(ctx.sibling_chapters.len(), 2);
    }

    #[test]
    fn test_context_for_unknown() {
        assert!(sample().context_for("9").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = Outline::new(vec![
            OutlineItem::new("1", "a"),
            OutlineItem::new("2", "b").with_children(vec![OutlineItem::new("1", "c")]),
        ]);
        assert_eq!(result.unwrap_err(), OutlineError::DuplicateId("1".to_string()));
    }

    #[test]
    fn test_set_content_only_on_leaf() {
        let mut outline = sample();
        outline.set_content("1.1", "正文").unwrap();
        assert_eq!(outline.find("1.1").unwrap().content.as_deref(), Some("正文"));
        assert_eq!(
            outline.set_content("1.2", "x"),
            Err(OutlineError::NotALeaf("1.2".to_string()))
        );
    }

    #[test]
    fn test_from_json_wrapped_and_bare() {
        let wrapped = r#"{"outline":[{"id":"1","title":"概述","description":"d","children":[]}]}"#;
        let bare = r#"[{"id":"1","title":"概述"}]"#;
        assert_eq!(Outline::from_json(wrapped).unwrap().items().len(), 1);
        assert_eq!(Outline::from_json(bare).unwrap().items()[0].title, "概述");
        assert!(Outline::from_json("not json").is_err());
    }
}
