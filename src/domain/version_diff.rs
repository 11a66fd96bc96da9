//! 版本差异展示
//!
//! 贪心逐行匹配，不是最小编辑距离算法，只用于界面展示，
//! 不用于生成补丁或修改已存储的内容。
//! 内容相同但顺序调换的行可能被显示为一删一增。

use serde::Serialize;

/// 展示时最多渲染的差异行数
pub const DIFF_DISPLAY_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Unchanged,
    Added,
    Removed,
}

impl DiffKind {
    pub fn marker(&self) -> char {
        match self {
            DiffKind::Unchanged => ' ',
            DiffKind::Added => '+',
            DiffKind::Removed => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub kind: DiffKind,
    pub text: String,
}

impl DiffLine {
    fn new(kind: DiffKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

/// 对比两段文本
///
/// 旧文本的每一行在新文本中查找第一个尚未匹配的相同行：
/// 找到则为 unchanged，否则为 removed。
/// 最后按原顺序追加新文本中所有未匹配的行（added）。
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffLine> {
    let new_lines: Vec<&str> = new.lines().collect();
    let mut matched = vec![false; new_lines.len()];
    let mut result = Vec::with_capacity(new_lines.len());

    for line in old.lines() {
        let hit = new_lines
            .iter()
            .enumerate()
            .find(|(i, candidate)| !matched[*i] && **candidate == line)
            .map(|(i, _)| i);

        match hit {
            Some(i) => {
                matched[i] = true;
                result.push(DiffLine::new(DiffKind::Unchanged, line));
            }
            None => result.push(DiffLine::new(DiffKind::Removed, line)),
        }
    }

    for (line, _) in new_lines.iter().zip(&matched).filter(|(_, m)| !**m) {
        result.push(DiffLine::new(DiffKind::Added, line));
    }

    result
}

/// 截断后的展示视图
///
/// 只截断展示，统计数字基于完整的差异结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffView {
    pub lines: Vec<DiffLine>,
    pub hidden_count: usize,
    pub added: usize,
    pub removed: usize,
}

impl DiffView {
    pub fn new(all: Vec<DiffLine>, limit: usize) -> Self {
        let added = all.iter().filter(|l| l.kind == DiffKind::Added).count();
        let removed = all.iter().filter(|l| l.kind == DiffKind::Removed).count();
        let hidden_count = all.len().saturating_sub(limit);
        let mut lines = all;
        lines.truncate(limit);

        Self {
            lines,
            hidden_count,
            added,
            removed,
        }
    }

    pub fn compare(old: &str, new: &str) -> Self {
        Self::new(diff_lines(old, new), DIFF_DISPLAY_LIMIT)
    }

    pub fn has_changes(&self) -> bool {
        self.added > 0 || self.removed > 0
    }
}
