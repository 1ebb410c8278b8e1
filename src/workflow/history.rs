//! 会话历史
//!
//! 只追加的题目集合列表 + 一个游标。在中途回退后提交新集合时，
//! 游标之后的记录会被永久丢弃（线性撤销，不保留分支）

use crate::models::ProblemSet;

/// 一次前进 / 后退的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    /// 游标移动到了该位置
    Moved(usize),
    /// 从第一条记录后退，回到"未选中"状态
    Cleared,
    /// 无法移动
    Unchanged,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<ProblemSet>,
    /// `None` 表示没有选中任何集合（对外表现为 -1）
    cursor: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 当前游标，-1 表示未选中
    pub fn cursor(&self) -> isize {
        self.cursor.map_or(-1, |c| c as isize)
    }

    pub fn current(&self) -> Option<&ProblemSet> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn get(&self, index: usize) -> Option<&ProblemSet> {
        self.entries.get(index)
    }

    /// 截断游标之后的记录，追加新集合并指向它
    pub fn commit(&mut self, set: ProblemSet) -> usize {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push(set);
        let index = self.entries.len() - 1;
        self.cursor = Some(index);
        index
    }

    pub fn back(&mut self) -> HistoryStep {
        match self.cursor {
            Some(0) => {
                self.cursor = None;
                HistoryStep::Cleared
            }
            Some(c) => {
                self.cursor = Some(c - 1);
                HistoryStep::Moved(c - 1)
            }
            None => HistoryStep::Unchanged,
        }
    }

    pub fn forward(&mut self) -> HistoryStep {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.entries.len() {
            self.cursor = Some(next);
            HistoryStep::Moved(next)
        } else {
            HistoryStep::Unchanged
        }
    }

    /// 取消选中，但保留全部记录
    pub fn clear_selection(&mut self) {
        self.cursor = None;
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.entries.len()
    }
}
