//! A dynamic AABB tree broad-phase, implementing the consumed contract:
//! `CreateProxy`/`DestroyProxy`/`MoveProxy`/`TouchProxy`/`Query`/`RayCast`/
//! `UpdatePairs`. Proxies carry fattened AABBs so small motions don't
//! force a tree update every step; `UpdatePairs` re-queries the tree for
//! every proxy touched since the last call and reports each newly
//! overlapping pair exactly once.

use std::collections::HashSet;

use glam::Vec2;

use crate::config::{AABB_MARGIN, AABB_PREDICTION_FACTOR};
use crate::core::shapes::Aabb;

pub type ProxyId = u32;
const NULL_NODE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct Node {
    aabb: Aabb,
    parent: u32,
    child1: u32,
    child2: u32,
    height: i32,
    user_data: u64,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }
}

/// A dynamic, incrementally-balanced AABB bounding volume hierarchy, the
/// standard Box2D-family broad phase.
pub struct BroadPhase {
    nodes: Vec<Node>,
    root: u32,
    free_list: u32,
    /// Proxies whose fattened AABB was moved since the last `update_pairs`.
    moved: HashSet<ProxyId>,
}

impl Default for BroadPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadPhase {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NULL_NODE,
            free_list: NULL_NODE,
            moved: HashSet::new(),
        }
    }

    fn allocate_node(&mut self) -> u32 {
        if self.free_list != NULL_NODE {
            let id = self.free_list;
            self.free_list = self.nodes[id as usize].parent;
            self.nodes[id as usize] = Node {
                aabb: Aabb::EMPTY,
                parent: NULL_NODE,
                child1: NULL_NODE,
                child2: NULL_NODE,
                height: 0,
                user_data: 0,
            };
            id
        } else {
            let id = self.nodes.len() as u32;
            self.nodes.push(Node {
                aabb: Aabb::EMPTY,
                parent: NULL_NODE,
                child1: NULL_NODE,
                child2: NULL_NODE,
                height: 0,
                user_data: 0,
            });
            id
        }
    }

    fn free_node(&mut self, id: u32) {
        self.nodes[id as usize].parent = self.free_list;
        self.nodes[id as usize].height = -1;
        self.free_list = id;
    }

    /// Inserts a new proxy with a fattened AABB, returns its id.
    pub fn create_proxy(&mut self, aabb: Aabb, user_data: u64) -> ProxyId {
        let id = self.allocate_node();
        self.nodes[id as usize].aabb = aabb.fattened(AABB_MARGIN);
        self.nodes[id as usize].user_data = user_data;
        self.nodes[id as usize].height = 0;
        self.insert_leaf(id);
        self.moved.insert(id);
        id
    }

    pub fn destroy_proxy(&mut self, id: ProxyId) {
        self.remove_leaf(id);
        self.free_node(id);
        self.moved.remove(&id);
    }

    /// Re-fattens and re-inserts the proxy if its real AABB has moved
    /// outside the current fattened box; returns true if the tree changed.
    pub fn move_proxy(&mut self, id: ProxyId, aabb: Aabb, displacement: Vec2) -> bool {
        let fat_current = self.nodes[id as usize].aabb;
        if fat_current.contains(&aabb) {
            return false;
        }

        self.remove_leaf(id);

        let mut fattened = aabb.fattened(AABB_MARGIN);
        let predicted = displacement * AABB_PREDICTION_FACTOR;
        if predicted.x < 0.0 {
            fattened.lower.x += predicted.x;
        } else {
            fattened.upper.x += predicted.x;
        }
        if predicted.y < 0.0 {
            fattened.lower.y += predicted.y;
        } else {
            fattened.upper.y += predicted.y;
        }

        self.nodes[id as usize].aabb = fattened;
        self.insert_leaf(id);
        self.touch_proxy(id);
        true
    }

    /// Marks a proxy as moved without changing its AABB (e.g. a filter
    /// change forcing re-evaluation of pairs), per the consumed contract.
    pub fn touch_proxy(&mut self, id: ProxyId) {
        self.moved.insert(id);
    }

    pub fn fat_aabb(&self, id: ProxyId) -> Aabb {
        self.nodes[id as usize].aabb
    }

    pub fn user_data(&self, id: ProxyId) -> u64 {
        self.nodes[id as usize].user_data
    }

    fn insert_leaf(&mut self, leaf: u32) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf as usize].parent = NULL_NODE;
            return;
        }

        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let mut index = self.root;
        while !self.nodes[index as usize].is_leaf() {
            let child1 = self.nodes[index as usize].child1;
            let child2 = self.nodes[index as usize].child2;

            let cost1 = {
                let c1_aabb = self.nodes[child1 as usize].aabb.union(&leaf_aabb);
                let mut cost = c1_aabb.perimeter();
                if !self.nodes[child1 as usize].is_leaf() {
                    cost -= self.nodes[child1 as usize].aabb.perimeter();
                }
                cost
            };
            let cost2 = {
                let c2_aabb = self.nodes[child2 as usize].aabb.union(&leaf_aabb);
                let mut cost = c2_aabb.perimeter();
                if !self.nodes[child2 as usize].is_leaf() {
                    cost -= self.nodes[child2 as usize].aabb.perimeter();
                }
                cost
            };

            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;
        let old_parent = self.nodes[sibling as usize].parent;
        let new_parent = self.allocate_node();
        self.nodes[new_parent as usize].parent = old_parent;
        self.nodes[new_parent as usize].aabb = leaf_aabb.union(&self.nodes[sibling as usize].aabb);
        self.nodes[new_parent as usize].height = self.nodes[sibling as usize].height + 1;

        if old_parent != NULL_NODE {
            if self.nodes[old_parent as usize].child1 == sibling {
                self.nodes[old_parent as usize].child1 = new_parent;
            } else {
                self.nodes[old_parent as usize].child2 = new_parent;
            }
            self.nodes[new_parent as usize].child1 = sibling;
            self.nodes[new_parent as usize].child2 = leaf;
            self.nodes[sibling as usize].parent = new_parent;
            self.nodes[leaf as usize].parent = new_parent;
        } else {
            self.nodes[new_parent as usize].child1 = sibling;
            self.nodes[new_parent as usize].child2 = leaf;
            self.nodes[sibling as usize].parent = new_parent;
            self.nodes[leaf as usize].parent = new_parent;
            self.root = new_parent;
        }

        self.fix_upward(self.nodes[leaf as usize].parent);
    }

    fn remove_leaf(&mut self, leaf: u32) {
        if self.root == leaf {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf as usize].parent;
        let grandparent = self.nodes[parent as usize].parent;
        let sibling = if self.nodes[parent as usize].child1 == leaf {
            self.nodes[parent as usize].child2
        } else {
            self.nodes[parent as usize].child1
        };

        if grandparent != NULL_NODE {
            if self.nodes[grandparent as usize].child1 == parent {
                self.nodes[grandparent as usize].child1 = sibling;
            } else {
                self.nodes[grandparent as usize].child2 = sibling;
            }
            self.nodes[sibling as usize].parent = grandparent;
            self.free_node(parent);
            self.fix_upward(grandparent);
        } else {
            self.root = sibling;
            self.nodes[sibling as usize].parent = NULL_NODE;
            self.free_node(parent);
        }
    }

    fn fix_upward(&mut self, mut index: u32) {
        while index != NULL_NODE {
            let child1 = self.nodes[index as usize].child1;
            let child2 = self.nodes[index as usize].child2;
            self.nodes[index as usize].height =
                1 + self.nodes[child1 as usize].height.max(self.nodes[child2 as usize].height);
            self.nodes[index as usize].aabb =
                self.nodes[child1 as usize].aabb.union(&self.nodes[child2 as usize].aabb);
            index = self.nodes[index as usize].parent;
        }
    }

    /// Enumerates every leaf whose fattened AABB overlaps `aabb`, calling
    /// `cb(user_data)`; stops early if `cb` returns `false`.
    pub fn query<F: FnMut(u64) -> bool>(&self, aabb: Aabb, mut cb: F) {
        if self.root == NULL_NODE {
            return;
        }
        let mut stack = vec![self.root];
        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id as usize];
            if !node.aabb.overlaps(&aabb) {
                continue;
            }
            if node.is_leaf() {
                if !cb(node.user_data) {
                    return;
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Ray-casts through the tree. `cb(user_data, p1, p2) -> fraction`
    /// follows the exposed ray-cast callback contract: `0` stops, `1`
    /// continues as if no hit, negative ignores this leaf, `(0,1]` clips
    /// the segment and continues.
    pub fn ray_cast<F: FnMut(u64, Vec2, Vec2) -> f32>(&self, p1: Vec2, p2: Vec2, mut cb: F) {
        if self.root == NULL_NODE {
            return;
        }
        let mut max_fraction = 1.0f32;
        let mut segment_end = p2;
        let mut stack = vec![self.root];

        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id as usize];
            if !segment_aabb_overlap(p1, segment_end, node.aabb) {
                continue;
            }
            if node.is_leaf() {
                let fraction = cb(node.user_data, p1, segment_end);
                if fraction == 0.0 {
                    return;
                }
                if fraction > 0.0 && fraction <= max_fraction {
                    max_fraction = fraction;
                    segment_end = p1 + (segment_end - p1) * fraction;
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Invokes `cb(user_data_a, user_data_b)` once for every pair of
    /// proxies whose fattened AABBs now overlap and at least one has
    /// moved since the last call, then clears the moved set.
    pub fn update_pairs<F: FnMut(u64, u64)>(&mut self, mut cb: F) {
        let moved: Vec<ProxyId> = self.moved.iter().copied().collect();
        let mut seen = HashSet::new();

        for &id in &moved {
            let fat = self.nodes[id as usize].aabb;
            let data_a = self.nodes[id as usize].user_data;
            let mut hits = Vec::new();
            self.query(fat, |data_b| {
                hits.push(data_b);
                true
            });
            for data_b in hits {
                if data_b == data_a {
                    continue;
                }
                let key = if data_a < data_b {
                    (data_a, data_b)
                } else {
                    (data_b, data_a)
                };
                if seen.insert(key) {
                    cb(key.0, key.1);
                }
            }
        }

        self.moved.clear();
    }
}

fn segment_aabb_overlap(p1: Vec2, p2: Vec2, aabb: Aabb) -> bool {
    let seg_lower = p1.min(p2);
    let seg_upper = p1.max(p2);
    let seg_aabb = Aabb::new(seg_lower, seg_upper);
    seg_aabb.overlaps(&aabb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_query_proxy() {
        let mut tree = BroadPhase::new();
        let id = tree.create_proxy(Aabb::new(Vec2::ZERO, Vec2::new(1.0, 1.0)), 42);
        let mut found = Vec::new();
        tree.query(Aabb::new(Vec2::new(0.5, 0.5), Vec2::new(2.0, 2.0)), |d| {
            found.push(d);
            true
        });
        assert_eq!(found, vec![42]);
        tree.destroy_proxy(id);
        found.clear();
        tree.query(Aabb::new(Vec2::new(0.5, 0.5), Vec2::new(2.0, 2.0)), |d| {
            found.push(d);
            true
        });
        assert!(found.is_empty());
    }

    #[test]
    fn update_pairs_reports_overlap_once() {
        let mut tree = BroadPhase::new();
        tree.create_proxy(Aabb::new(Vec2::ZERO, Vec2::new(1.0, 1.0)), 1);
        tree.create_proxy(Aabb::new(Vec2::new(0.5, 0.5), Vec2::new(1.5, 1.5)), 2);
        let mut pairs = Vec::new();
        tree.update_pairs(|a, b| pairs.push((a.min(b), a.max(b))));
        assert_eq!(pairs, vec![(1, 2)]);
        let mut pairs2 = Vec::new();
        tree.update_pairs(|a, b| pairs2.push((a, b)));
        assert!(pairs2.is_empty());
    }
}
