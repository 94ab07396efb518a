//! Price level: the FIFO queue of all resting orders at one price.
//!
//! ## Queue structure
//!
//! ```text
//! head (oldest) <-> ... <-> tail (newest)
//! ```
//!
//! New orders append at the tail; matching consumes from the head; any
//! order can be spliced out in O(1) via its slab key. The level also
//! maintains the aggregate remaining quantity of its queue, which the
//! fill-or-kill admission walk and the level snapshot read directly.

use slab::Slab;

use crate::book::node::OrderNode;
use crate::types::{Price, Quantity};

/// Queue metadata for a single price. The order data itself lives in the
/// slab; the level holds only keys.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    pub price: Price,

    /// Sum of `remaining` across the queued orders.
    pub total_quantity: Quantity,

    /// Oldest order (matched first), as a slab key.
    pub head: Option<usize>,

    /// Newest order (appended last), as a slab key.
    pub tail: Option<usize>,

    pub order_count: usize,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            total_quantity: 0,
            head: None,
            tail: None,
            order_count: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Oldest order in the queue, the next to match at this price.
    #[inline]
    pub fn front(&self) -> Option<usize> {
        self.head
    }

    /// Append an order at the tail, preserving FIFO within the level.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not present in the slab.
    pub fn push_back(&mut self, key: usize, arena: &mut Slab<OrderNode>) {
        let node = arena.get_mut(key).expect("slab key must be live");
        let quantity = node.remaining();

        node.prev = self.tail;
        node.next = None;

        if let Some(tail_key) = self.tail {
            let tail_node = arena.get_mut(tail_key).expect("tail key must be live");
            tail_node.next = Some(key);
        } else {
            self.head = Some(key);
        }

        self.tail = Some(key);
        self.order_count += 1;
        self.total_quantity += quantity;
    }

    /// Splice an order out of the queue in O(1).
    ///
    /// Returns the order's remaining quantity at removal. The node itself
    /// stays in the slab; the caller decides whether to free it.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not present in the slab.
    pub fn remove(&mut self, key: usize, arena: &mut Slab<OrderNode>) -> Quantity {
        let node = arena.get(key).expect("slab key must be live");
        let quantity = node.remaining();
        let prev_key = node.prev;
        let next_key = node.next;

        if let Some(prev) = prev_key {
            arena.get_mut(prev).expect("prev key must be live").next = next_key;
        } else {
            self.head = next_key;
        }

        if let Some(next) = next_key {
            arena.get_mut(next).expect("next key must be live").prev = prev_key;
        } else {
            self.tail = prev_key;
        }

        let node = arena.get_mut(key).expect("slab key must be live");
        node.prev = None;
        node.next = None;

        self.order_count -= 1;
        self.total_quantity -= quantity;

        quantity
    }

    /// Account for a partial fill of one queued order.
    #[inline]
    pub fn reduce_quantity(&mut self, filled: Quantity) {
        self.total_quantity -= filled;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
