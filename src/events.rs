use crate::orderbook::OrderBook;
use crate::orders::{Order, OrderId, OrderStatus, Side};

/// A reversible mutation of engine state.
///
/// Executing an event applies its mutation; reverting undoes exactly that
/// mutation and nothing else. The engine appends every executed event to its
/// log so a rollback can replay inverses newest-first. Each variant carries
/// the data its own inverse needs, so revert never has to guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataEvent {
    /// Creates the next order in `Pending` state and admits it to the book
    /// and the id index.
    AddLimitOrder { side: Side, price: u64, amount: u64 },

    /// Takes a resting order out of the book; the id index keeps its record.
    /// `slot` is the queue position the order held at its price level,
    /// captured on execute so the revert restores exact time priority.
    RemoveOrder { id: OrderId, slot: usize },

    /// Applies a status change and/or a fill delta to an order. `None`
    /// means "leave the status alone"; both directions use the same
    /// sentinel.
    UpdateOrder {
        id: OrderId,
        amount_delta: u64,
        old_status: Option<OrderStatus>,
        new_status: Option<OrderStatus>,
    },
}

impl DataEvent {
    /// Removal event for `id`; the queue slot is captured when it executes.
    pub(crate) fn remove(id: OrderId) -> Self {
        DataEvent::RemoveOrder { id, slot: 0 }
    }

    pub(crate) fn execute(&mut self, book: &mut OrderBook, next_id: &mut OrderId) {
        match self {
            DataEvent::AddLimitOrder { side, price, amount } => {
                let order = Order {
                    id: *next_id,
                    side: *side,
                    price: *price,
                    amount: *amount,
                    completed_amount: 0,
                    status: OrderStatus::Pending,
                };
                *next_id += 1;
                book.insert(order);
            }
            DataEvent::RemoveOrder { id, slot } => {
                *slot = book.remove(*id);
            }
            DataEvent::UpdateOrder {
                id,
                amount_delta,
                new_status,
                ..
            } => {
                let order = resolve_mut(book, *id);
                if let Some(status) = new_status {
                    order.status = *status;
                }
                order.completed_amount += *amount_delta;
            }
        }
    }

    pub(crate) fn revert(&self, book: &mut OrderBook, next_id: &mut OrderId) {
        match self {
            DataEvent::AddLimitOrder { .. } => {
                // LIFO replay guarantees the most recent insertion holds
                // id `next_id - 1`.
                *next_id -= 1;
                let id = *next_id;
                resolve_mut(book, id).status = OrderStatus::Deleted;
                book.remove(id);
                book.purge(id);
            }
            DataEvent::RemoveOrder { id, slot } => {
                book.restore(*id, *slot);
            }
            DataEvent::UpdateOrder {
                id,
                amount_delta,
                old_status,
                ..
            } => {
                let order = resolve_mut(book, *id);
                if let Some(status) = old_status {
                    order.status = *status;
                }
                order.completed_amount -= *amount_delta;
            }
        }
    }
}

fn resolve_mut(book: &mut OrderBook, id: OrderId) -> &mut Order {
    book.order_mut(id)
        .unwrap_or_else(|| panic!("order book corrupted: event refers to unknown order {id}"))
}
