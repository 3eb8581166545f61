//! Borrower callback capability for flash swaps and flash borrows.

use crate::domain::{Address, Amount};
use crate::error::Result;
use crate::exchange::Exchange;

/// Receiver-side hook invoked by [`Exchange::swap`] and
/// [`Exchange::flash_borrow`] after the optimistic transfers out.
///
/// The callback runs *inside* the pool's exclusive section: the invoking
/// pool's guard is held for its whole duration, so any attempt to
/// re-enter a mutating entry point on the same pool fails with
/// [`AmmError::ReentrantCall`](crate::error::AmmError). Other pools are
/// fair game — operating on a different pool from inside the callback is
/// the legitimate cross-pool flash pattern.
///
/// The implementation is expected to deliver whatever the invariant or
/// repayment check at the end of the outer call requires, by transferring
/// into the pool through the exchange it is handed.
pub trait SwapCallback {
    /// Called with the amounts just sent out and the caller-supplied
    /// opaque data.
    ///
    /// # Errors
    ///
    /// Any error propagates to the outer call, which rolls back as a
    /// whole.
    fn on_swap(
        &mut self,
        exchange: &mut Exchange,
        caller: Address,
        amount_a_out: Amount,
        amount_b_out: Amount,
        data: &[u8],
    ) -> Result<()>;
}
