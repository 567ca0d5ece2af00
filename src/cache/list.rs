//! Arena-backed doubly-linked recency list
//!
//! Nodes live in a `Vec` and link to each other by index, so a node keeps the
//! same [`NodeId`] for its whole life: moving it to the front only rewires
//! `prev`/`next`. Removed slots are threaded onto a free list and reused by the
//! next push.

/// Stable handle to a node in a [`RecencyList`]
pub type NodeId = usize;

const NIL: NodeId = usize::MAX;

#[derive(Debug)]
struct Node<T> {
    value: Option<T>,
    prev: NodeId,
    next: NodeId,
}

/// Ordered list with the most recently used value at the front
#[derive(Debug)]
pub struct RecencyList<T> {
    nodes: Vec<Node<T>>,
    head: NodeId,
    tail: NodeId,
    free_head: NodeId,
    len: usize,
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyList<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            free_head: NIL,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Most recently used node
    pub fn front(&self) -> Option<NodeId> {
        (self.head != NIL).then_some(self.head)
    }

    /// Least recently used node
    pub fn back(&self) -> Option<NodeId> {
        (self.tail != NIL).then_some(self.tail)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id).and_then(|node| node.value.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(id).and_then(|node| node.value.as_mut())
    }

    /// Insert a value at the front and return its id
    pub fn push_front(&mut self, value: T) -> NodeId {
        let id = if self.free_head != NIL {
            let id = self.free_head;
            self.free_head = self.nodes[id].next;
            self.nodes[id] = Node {
                value: Some(value),
                prev: NIL,
                next: NIL,
            };
            id
        } else {
            self.nodes.push(Node {
                value: Some(value),
                prev: NIL,
                next: NIL,
            });
            self.nodes.len() - 1
        };

        self.attach_front(id);
        self.len += 1;
        id
    }

    /// Move an existing node to the front without changing its id
    pub fn move_to_front(&mut self, id: NodeId) {
        if id == self.head || !self.is_live(id) {
            return;
        }
        self.detach(id);
        self.attach_front(id);
    }

    /// Unlink a node and return its value; the slot is recycled
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        if !self.is_live(id) {
            return None;
        }
        self.detach(id);
        let value = self.nodes[id].value.take();
        self.nodes[id].next = self.free_head;
        self.free_head = id;
        self.len -= 1;
        value
    }

    /// Remove the least recently used value
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.back()?;
        self.remove(tail)
    }

    /// Drop every node and release the arena
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = NIL;
        self.tail = NIL;
        self.free_head = NIL;
        self.len = 0;
    }

    /// Iterate from most to least recently used
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn is_live(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|node| node.value.is_some())
    }

    fn detach(&mut self, id: NodeId) {
        let (prev, next) = (self.nodes[id].prev, self.nodes[id].next);

        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.nodes[id].prev = NIL;
        self.nodes[id].next = NIL;
    }

    fn attach_front(&mut self, id: NodeId) {
        self.nodes[id].prev = NIL;
        self.nodes[id].next = self.head;

        if self.head != NIL {
            self.nodes[self.head].prev = id;
        } else {
            self.tail = id;
        }
        self.head = id;
    }
}

pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    cursor: NodeId,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let node = &self.list.nodes[self.cursor];
        self.cursor = node.next;
        node.value.as_ref()
    }
}
