use crate::orders::OrderStatus;

/// Service for managing order status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Paid, Cancelled
    /// - Paid → Completed, Cancelled
    /// - Completed → Cancelled (refund scenario)
    /// - Cancelled → (no transitions allowed except to itself)
    /// - Any status → Same status (idempotent)
    pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        // Same status is always valid (idempotent)
        if from == to {
            return true;
        }

        match (from, to) {
            (OrderStatus::Pending, OrderStatus::Paid) => true,
            (OrderStatus::Pending, OrderStatus::Cancelled) => true,

            (OrderStatus::Paid, OrderStatus::Completed) => true,
            (OrderStatus::Paid, OrderStatus::Cancelled) => true,

            (OrderStatus::Completed, OrderStatus::Cancelled) => true,

            // From Cancelled - no transitions allowed (except to itself, handled above)
            (OrderStatus::Cancelled, _) => false,

            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(from: OrderStatus, to: OrderStatus) -> Result<OrderStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_to_paid() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Paid
        ));
    }

    #[test]
    fn test_pending_to_cancelled() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Cancelled
        ));
    }

    #[test]
    fn test_paid_to_completed() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Paid,
            OrderStatus::Completed
        ));
    }

    #[test]
    fn test_completed_to_cancelled_refund() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Completed,
            OrderStatus::Cancelled
        ));
    }

    #[test]
    fn test_pending_cannot_skip_to_completed() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Completed
        ));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Paid,
            OrderStatus::Pending
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Completed,
            OrderStatus::Paid
        ));
    }

    #[test]
    fn test_cancelled_is_terminal() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Cancelled,
            OrderStatus::Pending
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Cancelled,
            OrderStatus::Paid
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Cancelled,
            OrderStatus::Completed
        ));
    }

    #[test]
    fn test_transition_valid() {
        let result = StatusMachine::transition(OrderStatus::Paid, OrderStatus::Completed);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), OrderStatus::Completed);
    }

    #[test]
    fn test_transition_invalid() {
        let result = StatusMachine::transition(OrderStatus::Pending, OrderStatus::Completed);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid status transition"));
    }
}
