//! Property-based invariant checks over random operation sequences.
//!
//! After every operation the book must satisfy its structural
//! invariants; over a whole run the event stream must be dense and the
//! quantity ledger must balance.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use matchbook::book::Orderbook;
use matchbook::replay::trace::{self, TraceOp};
use matchbook::types::{Event, EventKind, OrderType, Side};

/// Small id space so duplicate submits, cancels of live orders and
/// modifies all actually hit.
fn op_strategy() -> impl Strategy<Value = TraceOp> {
    prop_oneof![
        4 => (1u64..40, 0u8..4, any::<bool>(), 1i64..50, 1u64..20).prop_map(
            |(id, type_raw, buy, price, qty)| TraceOp::Add {
                id,
                order_type: OrderType::from_u8(type_raw).unwrap(),
                side: if buy { Side::Buy } else { Side::Sell },
                price,
                qty,
            }
        ),
        2 => (1u64..40).prop_map(|id| TraceOp::Cancel { id }),
        1 => (1u64..40, any::<bool>(), 1i64..50, 1u64..20).prop_map(
            |(id, buy, price, qty)| TraceOp::Modify {
                id,
                side: if buy { Side::Buy } else { Side::Sell },
                price,
                qty,
            }
        ),
        1 => Just(TraceOp::Match),
    ]
}

/// Structural invariants that must hold between any two operations.
fn check_invariants(book: &Orderbook) {
    let infos = book.level_infos();

    // Cached best prices mirror the first level of each side.
    assert_eq!(
        book.best_bid(),
        infos.bids.first().map(|l| l.price).unwrap_or(0)
    );
    assert_eq!(
        book.best_ask(),
        infos.asks.first().map(|l| l.price).unwrap_or(0)
    );

    // Levels are never empty and stay sorted toward the best price.
    assert!(infos.bids.iter().all(|l| l.quantity > 0));
    assert!(infos.asks.iter().all(|l| l.quantity > 0));
    assert!(infos.bids.windows(2).all(|w| w[0].price > w[1].price));
    assert!(infos.asks.windows(2).all(|w| w[0].price < w[1].price));

    // Strict no-cross whenever both sides are populated.
    if !infos.bids.is_empty() && !infos.asks.is_empty() {
        assert!(book.best_bid() < book.best_ask());
    }

    // Each level holds at least one order.
    assert!(book.size() >= infos.bids.len() + infos.asks.len());
    assert_eq!(
        book.size() == 0,
        infos.bids.is_empty() && infos.asks.is_empty()
    );
}

fn observed_book() -> (Orderbook, Rc<RefCell<Vec<Event>>>) {
    let mut book = Orderbook::new();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    book.set_observer(Some(Box::new(move |event: &Event| {
        sink.borrow_mut().push(*event)
    })));
    book.enable_events(true);
    (book, events)
}

proptest! {
    #[test]
    fn invariants_hold_after_every_op(ops in prop::collection::vec(op_strategy(), 1..150)) {
        let (mut book, events) = observed_book();

        for op in &ops {
            trace::apply(&mut book, op).unwrap();
            check_invariants(&book);
        }

        // Sequence numbers are dense: 0, 1, 2, ...
        for (i, event) in events.borrow().iter().enumerate() {
            prop_assert_eq!(event.seq, i as u64);
        }

        // Quantity ledger: everything admitted is eventually traded
        // (draining both legs), cancelled, or still resting.
        let (mut added, mut traded, mut cancelled) = (0u64, 0u64, 0u64);
        for event in events.borrow().iter() {
            match event.kind {
                EventKind::Add => added += event.qty,
                EventKind::Trade => traded += event.qty,
                EventKind::Cancel => cancelled += event.qty,
                EventKind::Modify => {}
            }
        }
        let resting: u64 = {
            let infos = book.level_infos();
            infos.bids.iter().chain(infos.asks.iter()).map(|l| l.quantity).sum()
        };
        prop_assert_eq!(added, 2 * traded + cancelled + resting);
    }

    #[test]
    fn identical_sequences_produce_identical_books(
        ops in prop::collection::vec(op_strategy(), 1..100)
    ) {
        let mut a = Orderbook::new();
        let mut b = Orderbook::new();

        for op in &ops {
            trace::apply(&mut a, op).unwrap();
        }
        for op in &ops {
            trace::apply(&mut b, op).unwrap();
        }

        prop_assert_eq!(a.state_digest(), b.state_digest());
        prop_assert_eq!(a.size(), b.size());
        prop_assert_eq!(a.matched_count(), b.matched_count());
    }
}
