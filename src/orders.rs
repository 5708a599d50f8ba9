use serde::{Deserialize, Serialize};

/// Identifier the engine assigns to orders, contiguous from 0.
pub type OrderId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,  //rests in bids
    Sell, //rests in asks
}

/// Lifecycle of an order. `Completed`, `Cancelled` and `Deleted` are terminal
/// under normal operation but may transition back when an event is reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Admitted, nothing filled yet.
    Pending,
    /// Some quantity filled, some still open.
    PartiallyCompleted,
    /// The full amount has been filled.
    Completed,
    /// Withdrawn by the caller.
    Cancelled,
    /// The order's insertion itself was rolled back.
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: u64,
    pub amount: u64,
    pub completed_amount: u64,
    pub status: OrderStatus,
}

impl Order {
    /// Quantity still open for matching.
    pub fn remaining(&self) -> u64 {
        self.amount - self.completed_amount
    }

    /// An order rests in the book only while it still has quantity to trade.
    pub fn is_resting(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Pending | OrderStatus::PartiallyCompleted
        )
    }
}
