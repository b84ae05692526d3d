//! In-memory waypoint граф + инкрементальный BFS поиск пути

use std::collections::{HashMap, HashSet, VecDeque};

use bevy::prelude::*;

use super::{PathSearch, SearchPoll, WaypointGraph};
use crate::components::{PathFlags, WaypointFlags, WaypointId};

#[derive(Debug, Clone)]
struct Node {
    position: Vec3,
    flags: WaypointFlags,
    edges: Vec<(WaypointId, PathFlags)>,
}

/// Waypoint граф в памяти (id = индекс узла, удалённые узлы = None)
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    nodes: Vec<Option<Node>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_waypoint(&mut self, position: Vec3, flags: WaypointFlags) -> WaypointId {
        let id = WaypointId(self.nodes.len() as u32);
        self.nodes.push(Some(Node {
            position,
            flags,
            edges: Vec::new(),
        }));
        id
    }

    /// Однонаправленное ребро (повторное соединение заменяет флаги)
    pub fn connect(&mut self, from: WaypointId, to: WaypointId, flags: PathFlags) {
        if !self.is_valid(to) {
            return;
        }
        if let Some(node) = self.node_mut(from) {
            match node.edges.iter_mut().find(|(id, _)| *id == to) {
                Some(edge) => edge.1 = flags,
                None => node.edges.push((to, flags)),
            }
        }
    }

    pub fn connect_both(&mut self, a: WaypointId, b: WaypointId, flags: PathFlags) {
        self.connect(a, b, flags);
        self.connect(b, a, flags);
    }

    /// Удалить узел и все рёбра в него
    pub fn remove(&mut self, id: WaypointId) {
        if let Some(slot) = self.nodes.get_mut(id.0 as usize) {
            *slot = None;
        }
        for node in self.nodes.iter_mut().flatten() {
            node.edges.retain(|(to, _)| *to != id);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn node(&self, id: WaypointId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: WaypointId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize).and_then(Option::as_mut)
    }
}

impl WaypointGraph for MemoryGraph {
    fn is_valid(&self, id: WaypointId) -> bool {
        self.node(id).is_some()
    }

    fn position(&self, id: WaypointId) -> Option<Vec3> {
        self.node(id).map(|n| n.position)
    }

    fn flags(&self, id: WaypointId) -> WaypointFlags {
        self.node(id).map(|n| n.flags).unwrap_or(WaypointFlags::NONE)
    }

    fn path_flags(&self, from: WaypointId, to: WaypointId) -> PathFlags {
        self.node(from)
            .and_then(|n| n.edges.iter().find(|(id, _)| *id == to))
            .map(|(_, flags)| *flags)
            .unwrap_or(PathFlags::NONE)
    }

    fn neighbors(&self, id: WaypointId) -> Vec<WaypointId> {
        self.node(id)
            .map(|n| n.edges.iter().map(|(to, _)| *to).collect())
            .unwrap_or_default()
    }

    fn has_path(&self, from: WaypointId, to: WaypointId) -> bool {
        if !self.is_valid(from) || !self.is_valid(to) {
            return false;
        }
        let mut visited = HashSet::from([from]);
        let mut frontier = VecDeque::from([from]);
        while let Some(id) = frontier.pop_front() {
            if id == to {
                return true;
            }
            for next in self.neighbors(id) {
                if visited.insert(next) {
                    frontier.push_back(next);
                }
            }
        }
        false
    }

    fn nearest(&self, point: Vec3) -> Option<WaypointId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (WaypointId(i as u32), n.position.distance_squared(point))))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchStatus {
    Idle,
    Running,
    Found,
    Failed,
}

/// BFS с ограничением узлов за poll (амортизация как у настоящего навигатора)
#[derive(Debug, Clone)]
pub struct MemoryPathSearch {
    nodes_per_poll: usize,
    root: Option<WaypointId>,
    target: Option<WaypointId>,
    frontier: VecDeque<WaypointId>,
    parents: HashMap<WaypointId, WaypointId>,
    path: Vec<WaypointId>,
    status: SearchStatus,
}

impl Default for MemoryPathSearch {
    fn default() -> Self {
        Self::new(64)
    }
}

impl MemoryPathSearch {
    pub fn new(nodes_per_poll: usize) -> Self {
        Self {
            nodes_per_poll: nodes_per_poll.max(1),
            root: None,
            target: None,
            frontier: VecDeque::new(),
            parents: HashMap::new(),
            path: Vec::new(),
            status: SearchStatus::Idle,
        }
    }

    /// Найденный путь (from..=to), пустой пока поиск не закончен
    pub fn path(&self) -> &[WaypointId] {
        &self.path
    }

    fn done(&self) -> SearchPoll {
        match (self.path.get(1), self.path.first()) {
            (Some(next), _) => SearchPoll::Done {
                next: *next,
                after_next: self.path.get(2).copied(),
            },
            (None, Some(only)) => SearchPoll::Done {
                next: *only,
                after_next: None,
            },
            (None, None) => SearchPoll::Failed,
        }
    }

    fn reconstruct(&mut self, to: WaypointId) {
        let mut path = vec![to];
        let mut cursor = to;
        while let Some(parent) = self.parents.get(&cursor) {
            path.push(*parent);
            cursor = *parent;
        }
        path.reverse();
        self.path = path;
    }
}

impl PathSearch for MemoryPathSearch {
    fn start(&mut self, graph: &dyn WaypointGraph, from: WaypointId, to: WaypointId) {
        self.cancel();
        if !graph.is_valid(from) || !graph.is_valid(to) {
            self.status = SearchStatus::Failed;
            return;
        }
        self.root = Some(from);
        self.target = Some(to);
        self.frontier.push_back(from);
        if from == to {
            self.path = vec![from];
            self.status = SearchStatus::Found;
        } else {
            self.status = SearchStatus::Running;
        }
    }

    fn poll(&mut self, graph: &dyn WaypointGraph) -> SearchPoll {
        match self.status {
            SearchStatus::Idle | SearchStatus::Failed => return SearchPoll::Failed,
            SearchStatus::Found => return self.done(),
            SearchStatus::Running => {}
        }
        let Some(target) = self.target else {
            self.status = SearchStatus::Failed;
            return SearchPoll::Failed;
        };

        for _ in 0..self.nodes_per_poll {
            let Some(id) = self.frontier.pop_front() else {
                self.status = SearchStatus::Failed;
                return SearchPoll::Failed;
            };
            for next in graph.neighbors(id) {
                if next == id || self.parents.contains_key(&next) || self.root == Some(next) {
                    continue;
                }
                self.parents.insert(next, id);
                if next == target {
                    self.reconstruct(target);
                    self.status = SearchStatus::Found;
                    return self.done();
                }
                self.frontier.push_back(next);
            }
        }

        if self.frontier.is_empty() {
            self.status = SearchStatus::Failed;
            return SearchPoll::Failed;
        }
        SearchPoll::Pending
    }

    fn waypoint_after(&self, id: WaypointId) -> Option<WaypointId> {
        let index = self.path.iter().position(|w| *w == id)?;
        self.path.get(index + 1).copied()
    }

    fn cancel(&mut self) {
        self.root = None;
        self.target = None;
        self.frontier.clear();
        self.parents.clear();
        self.path.clear();
        self.status = SearchStatus::Idle;
    }

    fn is_running(&self) -> bool {
        self.status == SearchStatus::Running
    }
}
