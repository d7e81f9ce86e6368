//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 侵入式索引链表
//!
//! 参考 Linux: include/linux/list.h
//!
//! 用途：
//! - 就绪队列: RunQueue 每个优先级一条
//! - 进程树: Proc::children
//! - 已退出子进程: Proc::quit_children
//! - zap 等待者: Proc::zappers
//!
//! 与 list_head 的区别：节点之间不保存指针，而是保存进程表槽位下标。
//! 同一个 PCB 可以同时挂在不同种类的链表上，每一种各有一组链接字段。
//! 槽位复用时不会留下悬垂引用。

/// 链表种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// 就绪队列
    Ready = 0,
    /// 父进程的子进程链表
    Children = 1,
    /// 父进程的已退出子进程链表
    QuitChildren = 2,
    /// 目标进程的 zap 等待者链表
    Zappers = 3,
}

/// 链表种类数
pub const LIST_KINDS: usize = 4;

/// 嵌入在节点中的链接字段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListLink {
    /// 下一个节点
    pub next: Option<usize>,
    /// 前一个节点
    pub prev: Option<usize>,
    /// 是否已挂在某条链表上
    pub linked: bool,
}

impl ListLink {
    pub const fn new() -> Self {
        Self { next: None, prev: None, linked: false }
    }
}

/// 可挂入索引链表的节点
pub trait ListNode {
    fn link(&self, kind: ListKind) -> &ListLink;
    fn link_mut(&mut self, kind: ListKind) -> &mut ListLink;
}

/// 链表头
///
/// 只记录首尾下标，节点本身存放在调用者提供的切片中
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListHead {
    head: Option<usize>,
    tail: Option<usize>,
}

impl ListHead {
    /// 创建空链表
    pub const fn new() -> Self {
        Self { head: None, tail: None }
    }

    /// 检查链表是否为空
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// 第一个节点
    pub fn first(&self) -> Option<usize> {
        self.head
    }

    /// 在链表尾部添加节点
    ///
    /// 节点已经挂在同种链表上时返回 false，不做修改
    pub fn add_tail<N: ListNode>(&mut self, nodes: &mut [N], kind: ListKind, idx: usize) -> bool {
        if nodes[idx].link(kind).linked {
            return false;
        }

        let tail = self.tail;
        *nodes[idx].link_mut(kind) = ListLink { next: None, prev: tail, linked: true };
        match tail {
            Some(t) => nodes[t].link_mut(kind).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        true
    }

    /// 从链表中删除节点
    ///
    /// 节点不在本链表上时返回 false（幂等）
    pub fn del<N: ListNode>(&mut self, nodes: &mut [N], kind: ListKind, idx: usize) -> bool {
        if !self.contains(nodes, kind, idx) {
            return false;
        }

        let ListLink { next, prev, .. } = *nodes[idx].link(kind);
        match prev {
            Some(p) => nodes[p].link_mut(kind).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => nodes[n].link_mut(kind).prev = prev,
            None => self.tail = prev,
        }
        *nodes[idx].link_mut(kind) = ListLink::new();
        true
    }

    /// 取出第一个节点
    pub fn pop_front<N: ListNode>(&mut self, nodes: &mut [N], kind: ListKind) -> Option<usize> {
        let first = self.head?;
        self.del(nodes, kind, first);
        Some(first)
    }

    /// 节点是否在本链表上
    pub fn contains<N: ListNode>(&self, nodes: &[N], kind: ListKind, idx: usize) -> bool {
        self.iter(nodes, kind).any(|i| i == idx)
    }

    /// 节点个数
    pub fn len<N: ListNode>(&self, nodes: &[N], kind: ListKind) -> usize {
        self.iter(nodes, kind).count()
    }

    /// 按链表顺序遍历节点下标
    pub fn iter<'a, N: ListNode>(&self, nodes: &'a [N], kind: ListKind) -> ListIter<'a, N> {
        ListIter { nodes, kind, pos: self.head, remaining: nodes.len() }
    }
}

/// 链表迭代器
pub struct ListIter<'a, N> {
    nodes: &'a [N],
    kind: ListKind,
    pos: Option<usize>,
    /// 节点数上界，链接损坏时防止无限循环
    remaining: usize,
}

impl<N: ListNode> Iterator for ListIter<'_, N> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let pos = self.pos?;
        if self.remaining == 0 {
            log::warn!("list: too many iterations, breaking");
            self.pos = None;
            return None;
        }
        self.remaining -= 1;
        self.pos = self.nodes[pos].link(self.kind).next;
        Some(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Node {
        links: [ListLink; LIST_KINDS],
    }

    impl ListNode for Node {
        fn link(&self, kind: ListKind) -> &ListLink {
            &self.links[kind as usize]
        }

        fn link_mut(&mut self, kind: ListKind) -> &mut ListLink {
            &mut self.links[kind as usize]
        }
    }

    fn nodes(n: usize) -> Vec<Node> {
        (0..n).map(|_| Node::default()).collect()
    }

    #[test]
    fn test_list_init() {
        let head = ListHead::new();
        assert!(head.is_empty());
        assert_eq!(head.first(), None);
    }

    #[test]
    fn test_list_add_tail() {
        let mut nodes = nodes(4);
        let mut head = ListHead::new();

        assert!(head.add_tail(&mut nodes, ListKind::Ready, 2));
        assert!(head.add_tail(&mut nodes, ListKind::Ready, 0));
        assert!(head.add_tail(&mut nodes, ListKind::Ready, 3));

        // head -> 2 -> 0 -> 3
        let order: Vec<usize> = head.iter(&nodes, ListKind::Ready).collect();
        assert_eq!(order, vec![2, 0, 3]);
        assert_eq!(head.len(&nodes, ListKind::Ready), 3);
    }

    #[test]
    fn test_list_add_twice() {
        let mut nodes = nodes(2);
        let mut head = ListHead::new();

        assert!(head.add_tail(&mut nodes, ListKind::Children, 1));
        assert!(!head.add_tail(&mut nodes, ListKind::Children, 1));
        assert_eq!(head.len(&nodes, ListKind::Children), 1);
    }

    #[test]
    fn test_list_del() {
        let mut nodes = nodes(4);
        let mut head = ListHead::new();
        for i in 0..4 {
            head.add_tail(&mut nodes, ListKind::Zappers, i);
        }

        assert!(head.del(&mut nodes, ListKind::Zappers, 2));
        assert!(head.del(&mut nodes, ListKind::Zappers, 0));
        assert!(head.del(&mut nodes, ListKind::Zappers, 3));
        let order: Vec<usize> = head.iter(&nodes, ListKind::Zappers).collect();
        assert_eq!(order, vec![1]);

        // 重复删除是空操作
        assert!(!head.del(&mut nodes, ListKind::Zappers, 2));

        assert!(head.del(&mut nodes, ListKind::Zappers, 1));
        assert!(head.is_empty());
        assert!(!nodes[1].link(ListKind::Zappers).linked);
    }

    #[test]
    fn test_list_del_from_other_list() {
        let mut nodes = nodes(3);
        let mut a = ListHead::new();
        let mut b = ListHead::new();
        a.add_tail(&mut nodes, ListKind::Children, 0);
        b.add_tail(&mut nodes, ListKind::Children, 1);

        // 节点 1 不在 a 上
        assert!(!a.del(&mut nodes, ListKind::Children, 1));
        assert_eq!(b.first(), Some(1));
    }

    #[test]
    fn test_list_kinds_are_independent() {
        let mut nodes = nodes(3);
        let mut ready = ListHead::new();
        let mut children = ListHead::new();

        ready.add_tail(&mut nodes, ListKind::Ready, 0);
        ready.add_tail(&mut nodes, ListKind::Ready, 1);
        children.add_tail(&mut nodes, ListKind::Children, 1);
        children.add_tail(&mut nodes, ListKind::Children, 0);

        ready.del(&mut nodes, ListKind::Ready, 0);
        assert_eq!(ready.iter(&nodes, ListKind::Ready).collect::<Vec<_>>(), vec![1]);
        assert_eq!(children.iter(&nodes, ListKind::Children).collect::<Vec<_>>(), vec![1, 0]);
    }

    #[test]
    fn test_list_pop_front() {
        let mut nodes = nodes(3);
        let mut head = ListHead::new();
        head.add_tail(&mut nodes, ListKind::QuitChildren, 1);
        head.add_tail(&mut nodes, ListKind::QuitChildren, 2);

        assert_eq!(head.pop_front(&mut nodes, ListKind::QuitChildren), Some(1));
        assert_eq!(head.pop_front(&mut nodes, ListKind::QuitChildren), Some(2));
        assert_eq!(head.pop_front(&mut nodes, ListKind::QuitChildren), None);
    }
}
