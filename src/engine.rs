use crate::errors::EngineError;
use crate::events::DataEvent;
use crate::orderbook::{BookSnapshot, OrderBook};
use crate::orders::{Order, OrderId, OrderStatus, Side};
use tracing::{debug, trace};

/// A single-instrument limit-order matching engine with bookmark/rollback.
///
/// Incoming limit orders rest in the book and are immediately crossed against
/// the opposite side with price-time priority. Every state mutation flows
/// through a [`DataEvent`] appended to an undo log; [`Engine::rollback`]
/// replays the inverses newest-first until the log is back at the length
/// saved by [`Engine::bookmark`].
///
/// The engine is single-threaded: no operation blocks, and callers that need
/// shared access must serialize externally (e.g. a mutex around the whole
/// engine).
pub struct Engine {
    book: OrderBook,
    events: Vec<DataEvent>,
    bookmark: Option<usize>,
    next_id: OrderId,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            book: OrderBook::new(),
            events: Vec::new(),
            bookmark: None,
            next_id: 0,
        }
    }

    /// Admits a limit order, crosses it against the opposite side and returns
    /// a snapshot of the created order. Its status may already be
    /// `PartiallyCompleted` or `Completed` on return; [`Engine::order`]
    /// reflects any later changes.
    ///
    /// `price` and `amount` must be positive.
    pub fn add_limit_order(&mut self, side: Side, price: u64, amount: u64) -> Order {
        let id = self.next_id;
        debug!(id, ?side, price, amount, "limit order admitted");
        self.apply(DataEvent::AddLimitOrder { side, price, amount });
        self.match_incoming(id);
        self.book
            .order(id)
            .cloned()
            .unwrap_or_else(|| panic!("order book corrupted: order {id} gone after admission"))
    }

    /// Cancels a resting order. Unknown ids are ignored.
    ///
    /// Cancelling an order that already left the book (completed or
    /// previously cancelled) is a caller error and corrupts the book, which
    /// panics the engine.
    pub fn cancel_order(&mut self, id: OrderId) {
        let Some(order) = self.book.order(id) else {
            trace!(id, "cancel of unknown order ignored");
            return;
        };
        let old_status = order.status;
        debug!(id, "order cancelled");
        self.apply(DataEvent::UpdateOrder {
            id,
            amount_delta: 0,
            old_status: Some(old_status),
            new_status: Some(OrderStatus::Cancelled),
        });
        self.apply(DataEvent::remove(id));
    }

    /// Looks up an order by id. Returns `None` for ids the engine never
    /// assigned and for orders whose insertion was rolled back.
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.book.order(id)
    }

    /// Resting sell orders, ascending by price, FIFO within a level.
    pub fn ask_orders(&self) -> Vec<&Order> {
        self.book.ask_orders()
    }

    /// Resting buy orders, ascending by price, FIFO within a level.
    pub fn bid_orders(&self) -> Vec<&Order> {
        self.book.bid_orders()
    }

    /// Per-level aggregation of the current book.
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot::capture(&self.book)
    }

    /// Saves the current log position. A later [`Engine::rollback`] unwinds
    /// everything recorded after this point. Overwrites any earlier bookmark.
    pub fn bookmark(&mut self) {
        debug!(position = self.events.len(), "bookmark set");
        self.bookmark = Some(self.events.len());
    }

    /// Reverts every event recorded after the bookmark, newest first, until
    /// the log is back at the bookmarked length.
    ///
    /// Errors if no bookmark was ever set. A rollback with nothing to unwind
    /// succeeds as a no-op, and the bookmark stays valid afterwards, so
    /// repeated rollbacks are idempotent until new events are appended.
    pub fn rollback(&mut self) -> Result<(), EngineError> {
        let bookmark = self.bookmark.ok_or(EngineError::NoBookmark)?;
        if self.events.len() > bookmark {
            debug!(
                events = self.events.len() - bookmark,
                "rolling back to bookmark"
            );
        }
        while self.events.len() > bookmark {
            if let Some(event) = self.events.pop() {
                event.revert(&mut self.book, &mut self.next_id);
            }
        }
        Ok(())
    }

    /// Executes `event` and records it in the undo log.
    fn apply(&mut self, mut event: DataEvent) {
        event.execute(&mut self.book, &mut self.next_id);
        self.events.push(event);
    }

    /// Crosses the incoming order against the opposite side of the book.
    ///
    /// Resting orders are visited best price first (lowest ask for an
    /// incoming buy, highest bid for an incoming sell), FIFO within a price
    /// level. Each round closes `min(remaining, remaining)` on both sides;
    /// the loop ends once the incoming order is filled or the best opposite
    /// price no longer crosses its limit.
    fn match_incoming(&mut self, incoming_id: OrderId) {
        loop {
            let incoming = self.expect_order(incoming_id);
            let open = incoming.remaining();
            if open == 0 {
                return;
            }
            let (side, limit) = (incoming.side, incoming.price);

            let Some(resting) = self.book.best_counterparty(side) else {
                return;
            };
            let crossed = match side {
                Side::Buy => resting.price <= limit,
                Side::Sell => resting.price >= limit,
            };
            if !crossed {
                return;
            }

            let maker = resting.id;
            let price = resting.price;
            let fill = open.min(resting.remaining());
            trace!(taker = incoming_id, maker, price, fill, "orders crossed");
            // the resting side is settled first, mirroring the log order the
            // rollback relies on
            self.close_amount(maker, fill);
            self.close_amount(incoming_id, fill);
        }
    }

    /// Closes `amount` units of `id`. The order becomes `Completed` and
    /// leaves the book once it reaches its full size, `PartiallyCompleted`
    /// otherwise.
    fn close_amount(&mut self, id: OrderId, amount: u64) {
        let order = self.expect_order(id);
        let new_status = if order.completed_amount + amount == order.amount {
            OrderStatus::Completed
        } else {
            OrderStatus::PartiallyCompleted
        };
        let old_status = order.status;
        self.apply(DataEvent::UpdateOrder {
            id,
            amount_delta: amount,
            old_status: Some(old_status),
            new_status: Some(new_status),
        });
        if new_status == OrderStatus::Completed {
            self.apply(DataEvent::remove(id));
        }
    }

    fn expect_order(&self, id: OrderId) -> &Order {
        self.book
            .order(id)
            .unwrap_or_else(|| panic!("order book corrupted: unknown order {id}"))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
