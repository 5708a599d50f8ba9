use crate::orders::{Order, OrderId, Side};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// An [`OrderBook`] keeps resting orders in two price-ordered maps:
/// - `bids` (buy orders)
/// - `asks` (sell orders)
///
/// Each price level (key) holds a FIFO queue of order ids in a [`VecDeque`]
/// to maintain **price-time** priority. The orders themselves live in a
/// single owning store keyed by id; price levels and data events refer to
/// orders through that index.
pub struct OrderBook {
    /// Buy orders, keyed by price in ascending order.
    ///
    /// Matching walks this map from the end to reach the highest bid first.
    bids: BTreeMap<u64, VecDeque<OrderId>>,

    /// Sell orders, keyed by price in ascending order.
    ///
    /// Matching walks this map forwards to reach the lowest ask first.
    asks: BTreeMap<u64, VecDeque<OrderId>>,

    /// Every order ever admitted whose insertion has not been rolled back.
    /// Completed and cancelled orders stay here after leaving the book.
    orders: HashMap<OrderId, Order>,
}

impl OrderBook {
    /// Creates a new, empty [`OrderBook`] with no active bids or asks.
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: HashMap::new(),
        }
    }

    /// Admits `order` into the id index and appends it to the tail of the
    /// FIFO queue at its price, creating the level if absent.
    pub fn insert(&mut self, order: Order) {
        let (id, side, price) = (order.id, order.side, order.price);
        self.orders.insert(id, order);
        self.levels_mut(side).entry(price).or_default().push_back(id);
    }

    /// Unlinks `id` from the queue at its price and returns the slot it
    /// occupied there. The price level is pruned once its queue is empty.
    /// The id index keeps the order's record.
    ///
    /// Panics if the order is not resting at its recorded price; under the
    /// engine's contract that only happens when the book is corrupted.
    pub fn remove(&mut self, id: OrderId) -> usize {
        let (side, price) = {
            let order = self.resolve(id);
            (order.side, order.price)
        };
        let levels = self.levels_mut(side);
        let queue = levels
            .get_mut(&price)
            .unwrap_or_else(|| panic!("order book corrupted: no {side:?} level at price {price}"));
        let slot = queue
            .iter()
            .position(|&queued| queued == id)
            .unwrap_or_else(|| {
                panic!("order book corrupted: order {id} missing from level {price}")
            });
        queue.remove(slot);
        if queue.is_empty() {
            levels.remove(&price);
        }
        slot
    }

    /// Puts `id` back at `slot` of the queue at its price, restoring the
    /// exact time priority it held before [`OrderBook::remove`].
    pub fn restore(&mut self, id: OrderId, slot: usize) {
        let (side, price) = {
            let order = self.resolve(id);
            (order.side, order.price)
        };
        self.levels_mut(side)
            .entry(price)
            .or_default()
            .insert(slot, id);
    }

    /// Drops the record for `id` from the id index, returning it.
    ///
    /// Panics if the id is unknown.
    pub fn purge(&mut self, id: OrderId) -> Order {
        self.orders
            .remove(&id)
            .unwrap_or_else(|| panic!("order book corrupted: order {id} missing from the id index"))
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub(crate) fn order_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.orders.get_mut(&id)
    }

    /// Front order of the best opposite price level for an incoming order on
    /// `side`: the lowest ask for a buy, the highest bid for a sell.
    pub fn best_counterparty(&self, side: Side) -> Option<&Order> {
        match side {
            Side::Buy => self.best_ask(),
            Side::Sell => self.best_bid(),
        }
    }

    /// First-queued order at the lowest ask price.
    pub fn best_ask(&self) -> Option<&Order> {
        let (_, queue) = self.asks.first_key_value()?;
        queue.front().map(|&id| self.resolve(id))
    }

    /// First-queued order at the highest bid price.
    pub fn best_bid(&self) -> Option<&Order> {
        let (_, queue) = self.bids.last_key_value()?;
        queue.front().map(|&id| self.resolve(id))
    }

    /// Resting sell orders, ascending by price, FIFO within a level.
    pub fn ask_orders(&self) -> Vec<&Order> {
        self.unroll(&self.asks)
    }

    /// Resting buy orders, ascending by price, FIFO within a level.
    pub fn bid_orders(&self) -> Vec<&Order> {
        self.unroll(&self.bids)
    }

    fn unroll(&self, levels: &BTreeMap<u64, VecDeque<OrderId>>) -> Vec<&Order> {
        levels
            .values()
            .flatten()
            .map(|&id| self.resolve(id))
            .collect()
    }

    fn levels_mut(&mut self, side: Side) -> &mut BTreeMap<u64, VecDeque<OrderId>> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    fn resolve(&self, id: OrderId) -> &Order {
        self.orders
            .get(&id)
            .unwrap_or_else(|| panic!("order book corrupted: order {id} missing from the id index"))
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time per-level aggregation of the book, serializable for display
/// or fan-out by an enclosing surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// `(price, total remaining quantity)`, best bid (highest price) first.
    pub bids: Vec<(u64, u64)>,
    /// `(price, total remaining quantity)`, best ask (lowest price) first.
    pub asks: Vec<(u64, u64)>,
}

impl BookSnapshot {
    pub fn capture(book: &OrderBook) -> Self {
        let open =
            |queue: &VecDeque<OrderId>| queue.iter().map(|&id| book.resolve(id).remaining()).sum();
        Self {
            bids: book.bids.iter().rev().map(|(&p, q)| (p, open(q))).collect(),
            asks: book.asks.iter().map(|(&p, q)| (p, open(q))).collect(),
        }
    }
}
