//! The grid-boundary nodes that feed a program's stdin sequence in and
//! collect its stdout sequence out.

use std::collections::VecDeque;

use crate::core::Port;
use crate::fabric::{Intent, Offer, Resolution, Selector};
use crate::value::Value;

/// Feeds a fixed sequence of values into the grid, one per successful
/// handshake, through a single fixed port.
#[derive(Debug)]
pub struct InputNode {
    port: Port,
    queue: VecDeque<Value>,
}

impl InputNode {
    /// Construct an `InputNode` that feeds `values` out through `port`.
    pub fn new(port: Port, values: Vec<Value>) -> InputNode {
        InputNode { port, queue: values.into() }
    }

    /// Whether every value has been delivered.
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn offer(&self) -> Vec<Offer> {
        match self.queue.front() {
            Some(&value) => vec![Offer { selector: Selector::Port(self.port), intent: Intent::Write(value) }],
            None => Vec::new(),
        }
    }

    pub fn retire(&mut self, resolutions: &[(Port, Resolution)]) -> bool {
        if resolutions.iter().any(|&(_, r)| r == Resolution::Written) {
            self.queue.pop_front();
            true
        } else {
            false
        }
    }
}

/// Collects every value the grid sends it through a single fixed port.
#[derive(Debug, Default)]
pub struct OutputNode {
    port: Option<Port>,
    received: Vec<Value>,
}

impl OutputNode {
    /// Construct an `OutputNode` that listens on `port`.
    pub fn new(port: Port) -> OutputNode {
        OutputNode { port: Some(port), received: Vec::new() }
    }

    /// The values received so far, in arrival order.
    pub fn received(&self) -> &[Value] {
        &self.received
    }

    pub fn offer(&self) -> Vec<Offer> {
        match self.port {
            Some(port) => vec![Offer { selector: Selector::Port(port), intent: Intent::Read }],
            None => Vec::new(),
        }
    }

    pub fn retire(&mut self, resolutions: &[(Port, Resolution)]) -> bool {
        let mut progressed = false;
        for &(_, resolution) in resolutions {
            if let Resolution::Read(value) = resolution {
                self.received.push(value);
                progressed = true;
            }
        }
        progressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Port::*;

    #[test]
    fn input_node_delivers_values_in_order() {
        let mut input = InputNode::new(Down, vec![Value::new(1), Value::new(2)]);
        assert_eq!(input.offer(), vec![Offer { selector: Selector::Port(Down), intent: Intent::Write(Value::new(1)) }]);

        input.retire(&[(Down, Resolution::Written)]);
        assert_eq!(input.offer(), vec![Offer { selector: Selector::Port(Down), intent: Intent::Write(Value::new(2)) }]);
    }

    #[test]
    fn input_node_stops_offering_once_exhausted() {
        let mut input = InputNode::new(Down, vec![Value::new(1)]);
        input.retire(&[(Down, Resolution::Written)]);
        assert!(input.is_exhausted());
        assert!(input.offer().is_empty());
    }

    #[test]
    fn output_node_collects_every_received_value() {
        let mut output = OutputNode::new(Up);
        output.retire(&[(Up, Resolution::Read(Value::new(42)))]);
        assert_eq!(output.received(), &[Value::new(42)]);
    }
}
