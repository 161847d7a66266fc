/*!
 * Atomic Word Operations
 *
 * The only operations the lock algorithms use on their state words.
 * Everything is sequentially consistent; `pause` is a pure performance hint.
 */

use std::sync::atomic::{AtomicU32, Ordering};

/// Atomically replace `word` with `new` if it equals `expected`
///
/// Returns the value observed before the operation, whether or not the swap
/// happened (callers compare it against `expected`).
#[inline(always)]
pub fn compare_and_swap(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    match word.compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst) {
        Ok(old) | Err(old) => old,
    }
}

/// Atomically store `new` into `word`, returning the previous value
#[inline(always)]
pub fn exchange(word: &AtomicU32, new: u32) -> u32 {
    word.swap(new, Ordering::SeqCst)
}

/// Spin-loop hint for the CPU (`pause` on x86, `yield`/`isb` on ARM)
#[inline(always)]
pub fn pause() {
    std::hint::spin_loop();
}
