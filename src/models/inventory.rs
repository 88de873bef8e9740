use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of managed object a hierarchy node wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Datacenter,
    ComputeResource,
    HostSystem,
    VirtualMachine,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Datacenter => "datacenter",
            EntityKind::ComputeResource => "compute-resource",
            EntityKind::HostSystem => "host",
            EntityKind::VirtualMachine => "vm",
        };
        write!(f, "{}", name)
    }
}

/// Lightweight reference to a managed object. Used as the node value in
/// hierarchy trees and as the target of performance queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedEntity {
    pub kind: EntityKind,
    /// Server-side managed object id, stable across sessions.
    pub moid: String,
    pub name: String,
}

impl ManagedEntity {
    pub fn new(kind: EntityKind, moid: impl Into<String>, name: impl Into<String>) -> Self {
        Self { kind, moid: moid.into(), name: name.into() }
    }
}

impl fmt::Display for ManagedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
}

/// Quick-stats snapshot reported alongside a VM, memory figures in MB.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickStats {
    /// Memory granted to the VM from the host's swap space.
    pub swapped_memory: i64,
    /// Size of the balloon driver, inflated by the host to reclaim
    /// physical memory from the VM.
    pub ballooned_memory: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmInfo {
    pub moid: String,
    pub name: String,
    pub power_state: PowerState,
    #[serde(default)]
    pub quick_stats: QuickStats,
}

impl VmInfo {
    pub fn entity(&self) -> ManagedEntity {
        ManagedEntity::new(EntityKind::VirtualMachine, &self.moid, &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    pub moid: String,
    pub name: String,
    pub power_state: PowerState,
    /// Virtual machines resident on this host.
    #[serde(default)]
    pub vms: Vec<VmInfo>,
}

impl HostInfo {
    pub fn entity(&self) -> ManagedEntity {
        ManagedEntity::new(EntityKind::HostSystem, &self.moid, &self.name)
    }
}

/// A compute resource: a cluster of member hosts (a standalone compute
/// resource is a cluster of one).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub moid: String,
    pub name: String,
    #[serde(default)]
    pub hosts: Vec<HostInfo>,
}

impl ClusterInfo {
    pub fn entity(&self) -> ManagedEntity {
        ManagedEntity::new(EntityKind::ComputeResource, &self.moid, &self.name)
    }
}

/// One entry of a datacenter's host folder. Folders nest arbitrarily deep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FolderItem {
    Folder { items: Vec<FolderItem> },
    Host(HostInfo),
    Cluster(ClusterInfo),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Datacenter {
    pub moid: String,
    pub name: String,
    /// Contents of the datacenter's host folder.
    #[serde(default)]
    pub host_folder: Vec<FolderItem>,
}

impl Datacenter {
    pub fn entity(&self) -> ManagedEntity {
        ManagedEntity::new(EntityKind::Datacenter, &self.moid, &self.name)
    }
}
