use log::info;

use crate::{
    db_types::{NewPayment, Payment},
    traits::{PaymentApiError, PaymentLedger},
};

/// The payment ledger API. `record_payment` is the only way a payment row comes into existence; it is
/// called by the payment agent's confirmation callback and nowhere else.
#[derive(Debug, Clone)]
pub struct PaymentsApi<B> {
    db: B,
}

impl<B> PaymentsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> PaymentsApi<B>
where B: PaymentLedger
{
    /// Records a confirmed payment. From this instant the sweeper's payment-timeout pass will leave the
    /// booking alone.
    pub async fn record_payment(&self, payment: NewPayment) -> Result<Payment, PaymentApiError> {
        let payment = self.db.insert_payment(payment).await?;
        info!("💰️ Payment {} recorded: booking {}, {}", payment.txid, payment.booking_id, payment.amount);
        Ok(payment)
    }

    /// The latest payment for a booking, for receipt display.
    pub async fn receipt(&self, booking_id: i64) -> Result<Option<Payment>, PaymentApiError> {
        self.db.fetch_payment_for_booking(booking_id).await
    }

    /// Administrative reversal: flips the payment's status to `Cancelled` in place. Deliberately not
    /// linked to booking-level cancellation; see DESIGN.md.
    pub async fn cancel_payment(&self, booking_id: i64) -> Result<Payment, PaymentApiError> {
        self.db.cancel_payment_for_booking(booking_id).await
    }
}
