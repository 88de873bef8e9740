//! Builds one containment hierarchy per datacenter from the inventory
//! views and derives the cross-tree lookup maps.

use crate::models::{ClusterInfo, Datacenter, FolderItem, HostInfo, ManagedEntity};
use crate::tree::{Arena, Hierarchy, IdAllocator, Node, NodeId, TreeError};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Host-folder contents resolved to the objects that sit directly under a
/// datacenter.
enum HostOrCluster<'a> {
    Host(&'a HostInfo),
    Cluster(&'a ClusterInfo),
}

/// Recursively unwrap folders; non-folder objects are appended in order.
/// Nesting depth is unbounded and resolved eagerly before any node is
/// created.
fn resolve_children<'a>(items: &'a [FolderItem], results: &mut Vec<HostOrCluster<'a>>) {
    for item in items {
        match item {
            FolderItem::Folder { items } => resolve_children(items, results),
            FolderItem::Host(host) => results.push(HostOrCluster::Host(host)),
            FolderItem::Cluster(cluster) => results.push(HostOrCluster::Cluster(cluster)),
        }
    }
}

/// Build the containment tree for one datacenter.
///
/// Bare hosts sit directly under the datacenter with their VMs below;
/// clusters add one level, with member hosts parented by the cluster and
/// VMs parented by their host. A datacenter with no hosts yields a
/// root-only tree.
pub fn build_datacenter_tree(
    ids: &mut IdAllocator,
    dc: &Datacenter,
) -> Result<Hierarchy<ManagedEntity>, TreeError> {
    let mut arena = Arena::new();
    let root = arena.create_node(ids, vec![], dc.entity(), vec![]);

    let mut flattened = Vec::new();
    resolve_children(&dc.host_folder, &mut flattened);

    for item in flattened {
        match item {
            HostOrCluster::Host(host) => {
                let host_idx = arena.create_node(ids, vec![root], host.entity(), vec![]);
                arena.add_child(root, host_idx);
                attach_vms(&mut arena, ids, host_idx, host);
            },
            HostOrCluster::Cluster(cluster) => {
                let cluster_idx = arena.create_node(ids, vec![root], cluster.entity(), vec![]);
                arena.add_child(root, cluster_idx);
                for host in &cluster.hosts {
                    let host_idx = arena.create_node(ids, vec![cluster_idx], host.entity(), vec![]);
                    arena.add_child(cluster_idx, host_idx);
                    attach_vms(&mut arena, ids, host_idx, host);
                }
            },
        }
    }

    Hierarchy::build(arena, root)
}

fn attach_vms(
    arena: &mut Arena<ManagedEntity>,
    ids: &mut IdAllocator,
    host_idx: usize,
    host: &HostInfo,
) {
    for vm in &host.vms {
        let vm_idx = arena.create_node(ids, vec![host_idx], vm.entity(), vec![]);
        arena.add_child(host_idx, vm_idx);
    }
}

/// All datacenter trees plus id/name lookup maps derived across them.
pub struct Inventory {
    trees: Vec<Hierarchy<ManagedEntity>>,
    id_map: HashMap<NodeId, String>,
    name_map: HashMap<String, Vec<NodeId>>,
}

impl Inventory {
    /// Build one hierarchy per datacenter with a single id allocator, so
    /// node ids are unique across the whole environment.
    pub fn build(datacenters: &[Datacenter]) -> Result<Self, TreeError> {
        let mut ids = IdAllocator::new();
        let mut trees = Vec::with_capacity(datacenters.len());
        for dc in datacenters {
            trees.push(build_datacenter_tree(&mut ids, dc)?);
        }

        let mut id_map = HashMap::new();
        let mut name_map: HashMap<String, Vec<NodeId>> = HashMap::new();
        for tree in &trees {
            for node in tree.nodes() {
                id_map.insert(node.id, node.value.name.clone());
                name_map.entry(node.value.name.clone()).or_default().push(node.id);
            }
        }

        Ok(Self { trees, id_map, name_map })
    }

    pub fn trees(&self) -> &[Hierarchy<ManagedEntity>] {
        &self.trees
    }

    pub fn node_count(&self) -> usize {
        self.trees.iter().map(Hierarchy::len).sum()
    }

    /// Search every tree for the node with the given id.
    pub fn find_node(&self, id: NodeId) -> Option<&Node<ManagedEntity>> {
        self.trees.iter().find_map(|tree| tree.find_by_id(id))
    }

    /// Resolve the managed entity behind a node id, for stats queries.
    pub fn entity_by_id(&self, id: NodeId) -> Option<&ManagedEntity> {
        self.find_node(id).map(|node| &node.value)
    }

    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.id_map.get(&id).map(String::as_str)
    }

    /// Every node id carrying this display name. Display names are not
    /// unique, so all matches are returned instead of one silently winning.
    pub fn ids_by_name(&self, name: &str) -> &[NodeId] {
        self.name_map.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Log-friendly listing of every node, grouped by tree.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (i, tree) in self.trees.iter().enumerate() {
            let listing = tree
                .nodes()
                .map(|node| format!("{}: {}", node.value.name, node.id))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "(tree{}) {}", i, listing);
        }
        out
    }
}
