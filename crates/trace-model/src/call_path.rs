//! Call-path tree built from enter/leave events.
//!
//! Each node is one region in the context of its call path; node data is
//! kept per location so the emitter can tell serial from parallel regions.
//! A per-location frame stack turns the flat event stream into the tree and
//! splits inclusive from exclusive time on the way.

use crate::collections::HashMap;
use crate::stats::{CollopData, FunctionData, MessageData};
use crate::{LocationRef, MetricRef, RegionRef};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallPathError {
    #[error("leave without matching enter on location {location}")]
    UnbalancedLeave { location: LocationRef },
}

/// Everything accumulated for one (node, location) pair.
#[derive(Debug, Default)]
pub struct NodeData {
    pub f_data: FunctionData,
    pub m_data: MessageData,
    pub c_data: CollopData,
    /// Counter samples attributed to this node, summed per metric.
    pub metrics: HashMap<MetricRef, u64>,
}

#[derive(Debug)]
pub struct CallNode {
    pub region: RegionRef,
    pub parent: Option<usize>,
    children: HashMap<RegionRef, usize>,
    pub node_data: HashMap<LocationRef, NodeData>,
}

#[derive(Debug)]
struct Frame {
    node: usize,
    enter_time: u64,
    /// Inclusive time already attributed to completed children.
    child_time: u64,
}

#[derive(Debug, Default)]
pub struct CallPathTree {
    nodes: Vec<CallNode>,
    roots: HashMap<RegionRef, usize>,
    stacks: HashMap<LocationRef, Vec<Frame>>,
}

impl CallPathTree {
    /// Pushes `region` onto `location`'s call stack at `time`.
    pub fn enter(&mut self, location: LocationRef, region: RegionRef, time: u64) {
        let parent = self
            .stacks
            .get(&location)
            .and_then(|stack| stack.last())
            .map(|frame| frame.node);

        let node = self.child_node(parent, region);
        self.stacks.entry(location).or_default().push(Frame {
            node,
            enter_time: time,
            child_time: 0,
        });
    }

    /// Pops `location`'s current frame at `time`, folding its inclusive and
    /// exclusive times into the node.
    pub fn leave(&mut self, location: LocationRef, time: u64) -> Result<(), CallPathError> {
        let stack = self.stacks.entry(location).or_default();
        let frame = stack
            .pop()
            .ok_or(CallPathError::UnbalancedLeave { location })?;

        let incl_time = time.saturating_sub(frame.enter_time);
        let excl_time = incl_time.saturating_sub(frame.child_time);
        let data = self.nodes[frame.node]
            .node_data
            .entry(location)
            .or_default();
        data.f_data += FunctionData {
            count: 1,
            incl_time,
            excl_time,
        };

        if let Some(parent) = self.stacks.entry(location).or_default().last_mut() {
            parent.child_time += incl_time;
        }
        Ok(())
    }

    /// Region on top of `location`'s stack, if any.
    pub fn current_region(&self, location: LocationRef) -> Option<RegionRef> {
        let stack = self.stacks.get(&location)?;
        stack.last().map(|frame| self.nodes[frame.node].region)
    }

    /// Node data of `location`'s current frame; events that arrive outside
    /// any region have nowhere to go and get `None`.
    pub fn current_data(&mut self, location: LocationRef) -> Option<&mut NodeData> {
        let node = self.stacks.get(&location)?.last()?.node;
        Some(self.nodes[node].node_data.entry(location).or_default())
    }

    pub fn nodes(&self) -> &[CallNode] {
        &self.nodes
    }

    /// Locations with enters that never saw their leave.
    pub fn open_frames(&self) -> usize {
        self.stacks.values().map(Vec::len).sum()
    }

    fn child_node(&mut self, parent: Option<usize>, region: RegionRef) -> usize {
        let existing = match parent {
            Some(p) => self.nodes[p].children.get(&region).copied(),
            None => self.roots.get(&region).copied(),
        };
        if let Some(node) = existing {
            return node;
        }

        let node = self.nodes.len();
        self.nodes.push(CallNode {
            region,
            parent,
            children: HashMap::default(),
            node_data: HashMap::default(),
        });
        match parent {
            Some(p) => {
                self.nodes[p].children.insert(region, node);
            }
            None => {
                self.roots.insert(region, node);
            }
        }
        node
    }
}
