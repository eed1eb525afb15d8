//! Port arbitration between neighbouring nodes for a single tick.
//!
//! Every node that wants to move a value through a port submits an [`Offer`]
//! naming either a concrete port or the `ANY` wildcard. [`resolve`] pairs up
//! offers across the grid's wiring and reports, per node, which of its
//! offers were satisfied and on which concrete port.

use std::collections::HashMap;

use crate::core::{opposite_port, Port, PRIORITY};
use crate::value::Value;

/// A node's position in the grid's internal node table.
pub type NodeId = usize;

/// Which port (or wildcard) an offer addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Port(Port),
    Any,
}

/// What a node wants to do through the selected port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Read,
    Write(Value),
}

/// A single port request submitted by a node for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offer {
    pub selector: Selector,
    pub intent: Intent,
}

/// The outcome of a satisfied offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Read(Value),
    Written,
}

/// The fixed neighbour-by-port wiring for a grid of nodes.
#[derive(Debug, Default)]
pub struct Topology {
    edges: HashMap<(NodeId, Port), NodeId>,
}

impl Topology {
    /// Construct an empty topology.
    pub fn new() -> Topology {
        Topology { edges: HashMap::new() }
    }

    /// Wire two nodes together in both directions.
    pub fn connect(&mut self, a: NodeId, b: NodeId, port: Port) -> &mut Self {
        self.edges.insert((a, port), b);
        self.edges.insert((b, opposite_port(port)), a);
        self
    }

    /// The neighbour reachable from `node` through `port`, if any.
    pub fn neighbor(&self, node: NodeId, port: Port) -> Option<NodeId> {
        self.edges.get(&(node, port)).copied()
    }
}

/// Arbitrate one tick's worth of offers.
///
/// Resolution happens in two passes. First, every `ANY` offer is resolved in
/// ascending node-id order, each wildcard scanning its own neighbours in
/// `LEFT, RIGHT, UP, DOWN` priority order. Second, whatever concrete
/// port-to-port pairings remain are matched directly. This order is what
/// makes two neighbours simultaneously writing with `ANY` to a shared third
/// node deterministic: the lower-id node claims the receiver first.
pub fn resolve(
    offers: &HashMap<NodeId, Vec<Offer>>,
    topology: &Topology,
) -> HashMap<NodeId, Vec<(Port, Resolution)>> {
    let mut claimed: HashMap<(NodeId, Port), bool> = HashMap::new();
    let mut result: HashMap<NodeId, Vec<(Port, Resolution)>> = HashMap::new();

    let mut ids: Vec<NodeId> = offers.keys().copied().collect();
    ids.sort_unstable();

    for &id in &ids {
        let wildcards: Vec<Offer> = offers[&id]
            .iter()
            .copied()
            .filter(|o| o.selector == Selector::Any)
            .collect();

        for offer in wildcards {
            for &port in PRIORITY.iter() {
                if claimed.get(&(id, port)).copied().unwrap_or(false) {
                    continue;
                }
                if let Some(neighbor) = topology.neighbor(id, port) {
                    if try_claim(id, port, offer.intent, neighbor, offers, &mut claimed, &mut result) {
                        break;
                    }
                }
            }
        }
    }

    for &id in &ids {
        for offer in offers[&id].iter().copied() {
            let Selector::Port(port) = offer.selector else {
                continue;
            };
            if claimed.get(&(id, port)).copied().unwrap_or(false) {
                continue;
            }
            if let Some(neighbor) = topology.neighbor(id, port) {
                try_claim(id, port, offer.intent, neighbor, offers, &mut claimed, &mut result);
            }
        }
    }

    result
}

/// Attempt to pair `id`'s offer on `port` with a complementary offer from
/// `neighbor`. Returns `true` and records both resolutions on success.
fn try_claim(
    id: NodeId,
    port: Port,
    intent: Intent,
    neighbor: NodeId,
    offers: &HashMap<NodeId, Vec<Offer>>,
    claimed: &mut HashMap<(NodeId, Port), bool>,
    result: &mut HashMap<NodeId, Vec<(Port, Resolution)>>,
) -> bool {
    let back = opposite_port(port);

    if claimed.get(&(neighbor, back)).copied().unwrap_or(false) {
        return false;
    }

    let Some(candidates) = offers.get(&neighbor) else {
        return false;
    };

    for candidate in candidates {
        let addresses_us = match candidate.selector {
            Selector::Port(p) => p == back,
            Selector::Any => true,
        };
        if !addresses_us {
            continue;
        }

        let (mine, theirs) = match (intent, candidate.intent) {
            (Intent::Write(value), Intent::Read) => (Resolution::Written, Resolution::Read(value)),
            (Intent::Read, Intent::Write(value)) => (Resolution::Read(value), Resolution::Written),
            _ => continue,
        };

        claimed.insert((id, port), true);
        claimed.insert((neighbor, back), true);
        result.entry(id).or_default().push((port, mine));
        result.entry(neighbor).or_default().push((back, theirs));
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Port::*;

    fn cross() -> Topology {
        // Node 0 is the centre; 1=left, 2=right, 3=up, 4=down neighbours.
        let mut t = Topology::new();
        t.connect(0, 1, Left);
        t.connect(0, 2, Right);
        t.connect(0, 3, Up);
        t.connect(0, 4, Down);
        t
    }

    #[test]
    fn any_read_prefers_left_then_right_then_up_then_down() {
        let topo = cross();
        let mut offers = HashMap::new();
        offers.insert(0, vec![Offer { selector: Selector::Any, intent: Intent::Read }]);
        offers.insert(1, vec![Offer { selector: Selector::Port(Right), intent: Intent::Write(Value::new(1)) }]);
        offers.insert(2, vec![Offer { selector: Selector::Port(Left), intent: Intent::Write(Value::new(2)) }]);
        offers.insert(3, vec![Offer { selector: Selector::Port(Down), intent: Intent::Write(Value::new(3)) }]);
        offers.insert(4, vec![Offer { selector: Selector::Port(Up), intent: Intent::Write(Value::new(4)) }]);

        let result = resolve(&offers, &topo);
        assert_eq!(result[&0], vec![(Left, Resolution::Read(Value::new(1)))]);
    }

    #[test]
    fn two_wildcard_writers_contending_for_one_reader_break_tie_by_ascending_id() {
        let mut topo = Topology::new();
        // Writers 1 and 2 each have the shared reader (id 3) as their only
        // neighbour, via different ports, so the reader's own port priority
        // cannot decide the outcome: only processing order can.
        topo.connect(3, 1, Left);
        topo.connect(3, 2, Down);

        let mut offers = HashMap::new();
        offers.insert(3, vec![Offer { selector: Selector::Any, intent: Intent::Read }]);
        offers.insert(1, vec![Offer { selector: Selector::Any, intent: Intent::Write(Value::new(11)) }]);
        offers.insert(2, vec![Offer { selector: Selector::Any, intent: Intent::Write(Value::new(22)) }]);

        let result = resolve(&offers, &topo);
        assert_eq!(result[&3], vec![(Left, Resolution::Read(Value::new(11)))]);
        assert_eq!(result[&1], vec![(Right, Resolution::Written)]);
        assert!(result.get(&2).is_none());
    }

    #[test]
    fn unmatched_offers_produce_no_resolution() {
        let topo = cross();
        let mut offers = HashMap::new();
        offers.insert(0, vec![Offer { selector: Selector::Port(Left), intent: Intent::Read }]);
        // Node 1 never offers anything, so node 0's read goes unmatched.
        let result = resolve(&offers, &topo);
        assert!(result.get(&0).is_none());
    }
}
