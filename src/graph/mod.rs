//! Type Dependency Graph
//!
//! petgraph view of the frozen model: one node per declared type, one edge per
//! reference. Hierarchy edges (restriction, extension, union member, list item,
//! group reference) must form a DAG; field edges may loop, since recursive
//! data structures are legal.
//!
//! Shared by the resolver (ordering, cycle detection) and the `graph`
//! subcommand (DOT export).

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::{Particle, QName, SchemaModel, SimpleDerivation, TypeKind};

/// Why one type depends on another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Simple or enumeration restriction base
    Restriction,
    /// Complex type base (extension or restriction)
    Extension,
    /// Named member of a union
    UnionMember,
    /// Item type of a list
    ListItem,
    /// Model group or attribute group reference
    GroupRef,
    /// Type of an element or attribute field
    FieldType,
}

impl EdgeKind {
    /// Edges that must not form cycles
    pub fn is_hierarchy(&self) -> bool {
        !matches!(self, EdgeKind::FieldType)
    }

    fn dot_style(&self) -> &'static str {
        match self {
            EdgeKind::Restriction => "color=\"#FF5722\"",
            EdgeKind::Extension => "color=\"#00BCD4\"",
            EdgeKind::UnionMember => "color=\"#9C27B0\", style=dashed",
            EdgeKind::ListItem => "color=\"#607D8B\", style=dashed",
            EdgeKind::GroupRef => "color=\"#FF9800\"",
            EdgeKind::FieldType => "color=\"#404040\", style=dotted",
        }
    }
}

/// Dependency graph over declared types (builtins are leaves and omitted)
#[derive(Debug, Clone)]
pub struct TypeGraph {
    graph: DiGraph<QName, EdgeKind>,
    node_indices: HashMap<QName, NodeIndex>,
    /// Node kinds for DOT colouring
    kinds: HashMap<QName, &'static str>,
}

impl TypeGraph {
    /// Build the graph; nodes are added in canonical model order
    pub fn build(model: &SchemaModel) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut kinds = HashMap::new();

        for decl in model.types() {
            let idx = graph.add_node(decl.name.clone());
            node_indices.insert(decl.name.clone(), idx);
            kinds.insert(decl.name.clone(), decl.kind_name());
        }

        for decl in model.types() {
            let from = node_indices[&decl.name];
            let mut edges: Vec<(&QName, EdgeKind)> = Vec::new();
            match &decl.kind {
                TypeKind::Simple(s) => match &s.derivation {
                    SimpleDerivation::Restriction { base, .. } => edges.push((base, EdgeKind::Restriction)),
                    SimpleDerivation::List { item } => edges.push((item, EdgeKind::ListItem)),
                    SimpleDerivation::Union { members } => {
                        edges.extend(members.iter().map(|m| (m, EdgeKind::UnionMember)))
                    }
                },
                TypeKind::Enumeration(e) => {
                    edges.extend(e.base.iter().map(|b| (b, EdgeKind::Restriction)));
                    edges.extend(e.union_members.iter().map(|m| (m, EdgeKind::UnionMember)));
                }
                TypeKind::Complex(c) => {
                    edges.extend(c.derivation.as_ref().map(|d| (&d.base, EdgeKind::Extension)));
                    collect_particle_edges(model, &c.content, &mut edges);
                }
                TypeKind::Group(g) => collect_particle_edges(model, &g.content, &mut edges),
            }

            for (target, kind) in edges {
                if let Some(&to) = node_indices.get(target) {
                    graph.add_edge(from, to, kind);
                }
            }
        }

        Self {
            graph,
            node_indices,
            kinds,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Immediate dependencies of a type
    pub fn dependencies(&self, name: &QName) -> Vec<(&QName, EdgeKind)> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Immediate dependents of a type
    pub fn dependents(&self, name: &QName) -> Vec<(&QName, EdgeKind)> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &QName, direction: Direction) -> Vec<(&QName, EdgeKind)> {
        let Some(&idx) = self.node_indices.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<(NodeIndex, EdgeKind)> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (other, *e.weight())
            })
            .collect();
        // petgraph yields edges newest-first
        out.reverse();
        out.into_iter().map(|(i, k)| (&self.graph[i], k)).collect()
    }

    /// Copy of the graph keeping only hierarchy edges; node indices are preserved
    fn hierarchy(&self) -> DiGraph<QName, EdgeKind> {
        self.graph.filter_map(
            |_, name| Some(name.clone()),
            |_, kind| kind.is_hierarchy().then_some(*kind),
        )
    }

    /// Strongly connected components of the hierarchy, dependencies first.
    ///
    /// Members within a component are in canonical model order.
    pub fn resolution_order(&self) -> Vec<Vec<QName>> {
        let hierarchy = self.hierarchy();
        kosaraju_scc(&hierarchy)
            .into_iter()
            .map(|mut scc| {
                scc.sort();
                scc.into_iter().map(|idx| hierarchy[idx].clone()).collect()
            })
            .collect()
    }

    /// Every hierarchy cycle as a closed chain `A -> B -> ... -> A`.
    ///
    /// Each chain starts at the canonically-first member of its component, so
    /// a cycle is reported once and always the same way.
    pub fn cycles(&self) -> Vec<Vec<QName>> {
        let hierarchy = self.hierarchy();
        let mut cycles = Vec::new();

        for mut scc in kosaraju_scc(&hierarchy) {
            scc.sort();
            let start = scc[0];
            let self_loop = hierarchy.contains_edge(start, start);
            if scc.len() == 1 && !self_loop {
                continue;
            }
            if self_loop {
                cycles.push(vec![hierarchy[start].clone(), hierarchy[start].clone()]);
                continue;
            }

            let members: HashSet<NodeIndex> = scc.iter().copied().collect();
            let path = shortest_cycle(&hierarchy, start, &members);
            cycles.push(path.into_iter().map(|idx| hierarchy[idx].clone()).collect());
        }

        cycles.sort();
        cycles
    }

    /// Export as Graphviz DOT
    pub fn to_dot(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph TypeGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  bgcolor=\"#1e1e1e\";\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10, fontcolor=\"white\", color=\"#404040\"];\n");
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8, fontcolor=\"#808080\"];\n");
        output.push('\n');

        let color_map = [
            ("enumeration", "#FF5722"),
            ("simple", "#607D8B"),
            ("complex", "#00BCD4"),
            ("group", "#FF9800"),
        ];

        for idx in self.graph.node_indices() {
            let name = &self.graph[idx];
            let kind = self.kinds.get(name).copied().unwrap_or("simple");
            let color = color_map
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, c)| *c)
                .unwrap_or("#9E9E9E");
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\", fillcolor=\"{}\"];\n",
                dot_escape(&name.to_string()),
                dot_escape(&name.local),
                color
            ));
        }

        output.push('\n');

        for edge in self.graph.edge_references() {
            output.push_str(&format!(
                "  \"{}\" -> \"{}\" [{}];\n",
                dot_escape(&self.graph[edge.source()].to_string()),
                dot_escape(&self.graph[edge.target()].to_string()),
                edge.weight().dot_style()
            ));
        }

        output.push_str("}\n");
        output
    }
}

fn collect_particle_edges<'a>(model: &'a SchemaModel, content: &'a [Particle], edges: &mut Vec<(&'a QName, EdgeKind)>) {
    for particle in content {
        match particle {
            Particle::Field(f) => edges.push((&f.type_ref, EdgeKind::FieldType)),
            Particle::GroupRef(g) => edges.push((g, EdgeKind::GroupRef)),
            Particle::ElementRef(r) => {
                if let Some(element) = model.element(&r.element) {
                    edges.push((&element.type_ref, EdgeKind::FieldType));
                }
            }
        }
    }
}

/// BFS from `start` back to itself inside one component
fn shortest_cycle(
    graph: &DiGraph<QName, EdgeKind>,
    start: NodeIndex,
    members: &HashSet<NodeIndex>,
) -> Vec<NodeIndex> {
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        let mut next: Vec<NodeIndex> = graph
            .neighbors_directed(node, Direction::Outgoing)
            .filter(|n| members.contains(n))
            .collect();
        next.sort();
        next.dedup();
        for succ in next {
            if succ == start {
                let mut back = Vec::new();
                let mut cur = node;
                while cur != start {
                    back.push(cur);
                    cur = parent[&cur];
                }
                back.reverse();
                let mut path = vec![start];
                path.extend(back);
                path.push(start);
                return path;
            }
            if let std::collections::hash_map::Entry::Vacant(e) = parent.entry(succ) {
                e.insert(node);
                queue.push_back(succ);
            }
        }
    }
    vec![start, start]
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
