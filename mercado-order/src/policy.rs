//! Stock reconciliation policy.
//!
//! Two pure, total decision functions over the three status dimensions. They
//! never touch storage and never fail; everything else in the order subsystem
//! is plumbing around the booleans they return.
//!
//! The bias is deliberate: restore stock unless there is concrete evidence the
//! goods already left inventory for a paid, in-motion, or completed order.
//! Failing to restore leaks stock permanently; restoring too eagerly is
//! correctable by a later reconciliation.

use crate::models::{OrderStatus, PaymentStatus, ShippingStatus};

/// Should deleting an order put its items back into stock?
///
/// Deletion has no "proposed" side: the order is going away, so the decision
/// depends only on where it currently stands.
pub fn should_restore_on_delete(
    status: OrderStatus,
    payment: PaymentStatus,
    shipping: ShippingStatus,
) -> bool {
    // Already fulfilled; restoring would mint phantom stock.
    if matches!(status, OrderStatus::Completed | OrderStatus::Delivered) {
        return false;
    }

    // Paid and physically moving through fulfillment.
    if payment == PaymentStatus::Paid
        && matches!(
            shipping,
            ShippingStatus::Preparing | ShippingStatus::InTransit | ShippingStatus::Delivered
        )
    {
        return false;
    }

    // Paid and committed on the order dimension.
    if payment == PaymentStatus::Paid
        && matches!(
            status,
            OrderStatus::Confirmed | OrderStatus::Preparing | OrderStatus::InTransit
        )
    {
        return false;
    }

    true
}

/// Should a status update put the order's items back into stock?
///
/// Evaluated against the union of current and proposed values for all three
/// dimensions; callers resolve omitted fields to the current value first.
pub fn should_restore_on_status_update(
    cur_status: OrderStatus,
    new_status: OrderStatus,
    cur_payment: PaymentStatus,
    new_payment: PaymentStatus,
    cur_shipping: ShippingStatus,
    new_shipping: ShippingStatus,
) -> bool {
    // Idempotent re-submit: nothing changed, nothing restores.
    if cur_status == new_status && cur_payment == new_payment && cur_shipping == new_shipping {
        return false;
    }

    // Regression away from a committed sale.
    if matches!(
        new_status,
        OrderStatus::Devolucion | OrderStatus::Cancelled | OrderStatus::PendingNoPayment
    ) {
        return true;
    }

    if new_payment == PaymentStatus::Failed {
        return true;
    }

    // Shipping fell back to an unshipped state; the inequality guard keeps
    // unrelated writes that carry the same shipping value from re-triggering.
    if matches!(new_shipping, ShippingStatus::Pending | ShippingStatus::Returned)
        && new_shipping != cur_shipping
    {
        return true;
    }

    // Paid payment collapsing to failed. Covered by the new_payment check
    // above; kept as its own rule to state the intent.
    if cur_payment == PaymentStatus::Paid && new_payment == PaymentStatus::Failed {
        return true;
    }

    // Shipped-then-returned regression, stated explicitly for the same reason.
    if matches!(
        cur_shipping,
        ShippingStatus::Preparing | ShippingStatus::InTransit | ShippingStatus::Delivered
    ) && matches!(new_shipping, ShippingStatus::Pending | ShippingStatus::Returned)
    {
        return true;
    }

    false
}

/// The symmetric counterpart: an order moving *out of* a restock-triggering
/// state back into a progressing one must take its items out of stock again,
/// otherwise a cancel-then-reinstate cycle inflates inventory.
pub fn should_reserve_on_status_update(cur_status: OrderStatus, new_status: OrderStatus) -> bool {
    if cur_status == new_status {
        return false;
    }

    let leaving_restocked = matches!(
        cur_status,
        OrderStatus::Cancelled | OrderStatus::Devolucion | OrderStatus::PendingNoPayment
    );
    let entering_progressing = matches!(
        new_status,
        OrderStatus::Confirmed
            | OrderStatus::Preparing
            | OrderStatus::InTransit
            | OrderStatus::Delivered
            | OrderStatus::Completed
    );

    leaving_restocked && entering_progressing
}
