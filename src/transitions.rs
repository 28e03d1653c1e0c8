//! Legal status moves for orders and payments.
//!
//! Both graphs are constant adjacency lists consulted at runtime and never
//! mutated. A state never lists itself, so no-op transitions are rejected.

use crate::models::{OrderStatus, PaymentStatus};

/// Fixed mapping from a state to the states it may move to next.
#[derive(Debug)]
pub struct TransitionTable<S: 'static> {
    edges: &'static [(S, &'static [S])],
}

impl<S> TransitionTable<S>
where
    S: Copy + PartialEq + 'static,
{
    pub const fn new(edges: &'static [(S, &'static [S])]) -> Self {
        Self { edges }
    }

    pub fn next_states(&self, from: S) -> &'static [S] {
        self.edges
            .iter()
            .find(|(state, _)| *state == from)
            .map(|(_, next)| *next)
            .unwrap_or(&[])
    }

    pub fn is_terminal(&self, state: S) -> bool {
        self.next_states(state).is_empty()
    }
}

pub static ORDER_STATUS_TRANSITIONS: TransitionTable<OrderStatus> = TransitionTable::new(&[
    (
        OrderStatus::Pending,
        &[OrderStatus::Processing, OrderStatus::Cancelled],
    ),
    (
        OrderStatus::Processing,
        &[OrderStatus::Shipped, OrderStatus::Cancelled],
    ),
    (
        OrderStatus::Shipped,
        &[OrderStatus::Delivered, OrderStatus::Cancelled],
    ),
    (OrderStatus::Delivered, &[]),
    (OrderStatus::Cancelled, &[]),
]);

pub static PAYMENT_STATUS_TRANSITIONS: TransitionTable<PaymentStatus> = TransitionTable::new(&[
    (
        PaymentStatus::Pending,
        &[PaymentStatus::Paid, PaymentStatus::Failed],
    ),
    (PaymentStatus::Paid, &[PaymentStatus::Failed]),
    (PaymentStatus::Failed, &[PaymentStatus::Pending]),
]);

pub fn is_transition_allowed<S>(graph: &TransitionTable<S>, from: S, to: S) -> bool
where
    S: Copy + PartialEq + 'static,
{
    graph.next_states(from).contains(&to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_graph_matches_fulfillment_flow() {
        let allowed = [
            (OrderStatus::Pending, OrderStatus::Processing),
            (OrderStatus::Processing, OrderStatus::Shipped),
            (OrderStatus::Shipped, OrderStatus::Delivered),
            (OrderStatus::Pending, OrderStatus::Cancelled),
            (OrderStatus::Processing, OrderStatus::Cancelled),
            (OrderStatus::Shipped, OrderStatus::Cancelled),
        ];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                assert_eq!(
                    is_transition_allowed(&ORDER_STATUS_TRANSITIONS, from, to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn payment_graph_allows_retry_after_failure_only() {
        let allowed = [
            (PaymentStatus::Pending, PaymentStatus::Paid),
            (PaymentStatus::Pending, PaymentStatus::Failed),
            (PaymentStatus::Paid, PaymentStatus::Failed),
            (PaymentStatus::Failed, PaymentStatus::Pending),
        ];

        for from in PaymentStatus::ALL {
            for to in PaymentStatus::ALL {
                assert_eq!(
                    is_transition_allowed(&PAYMENT_STATUS_TRANSITIONS, from, to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn delivered_and_cancelled_are_terminal() {
        let terminal: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| ORDER_STATUS_TRANSITIONS.is_terminal(*s))
            .collect();
        assert_eq!(terminal, vec![OrderStatus::Delivered, OrderStatus::Cancelled]);
        assert!(!PaymentStatus::ALL
            .into_iter()
            .any(|s| PAYMENT_STATUS_TRANSITIONS.is_terminal(s)));
    }
}
