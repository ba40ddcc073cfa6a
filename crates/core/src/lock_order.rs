//! # Lock Order Module
//!
//! The deadlock-avoidance rule for two-account operations. Every caller
//! that needs exclusive access to a pair of accounts must request them in
//! the order this function returns, never in from/to argument order. Two
//! concurrent transfers between the same pair then always request locks
//! in the same global order, so no cycle of waiters can form.
//!
//! The rule is a total order over account numbers (lexicographic byte
//! comparison). It lives here as an explicit, tested function so a future
//! account-numbering scheme cannot silently break it.

use crate::account::AccountNumber;

/// Returns the pair in global lock-acquisition order: the smaller account
/// number first.
///
/// The two numbers must be distinct; the engine rejects same-account
/// transfers before reaching this point.
pub fn lock_order<'a>(
    a: &'a AccountNumber,
    b: &'a AccountNumber,
) -> (&'a AccountNumber, &'a AccountNumber) {
    debug_assert_ne!(a, b, "lock_order requires distinct accounts");
    if a.as_str() <= b.as_str() {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc(s: &str) -> AccountNumber {
        AccountNumber::parse(s).unwrap()
    }

    #[test]
    fn test_order_is_symmetric() {
        let a = acc("AC-10001");
        let b = acc("AC-10002");

        let (x1, y1) = lock_order(&a, &b);
        let (x2, y2) = lock_order(&b, &a);

        assert_eq!((x1, y1), (x2, y2));
        assert_eq!(x1, &a);
        assert_eq!(y1, &b);
    }

    #[test]
    fn test_order_is_total() {
        // For any distinct pair, exactly one ordering comes back,
        // and chained orderings never form a cycle.
        let accounts = [acc("AC-10001"), acc("AC-10002"), acc("AC-10003")];
        for a in &accounts {
            for b in &accounts {
                if a == b {
                    continue;
                }
                let (first, second) = lock_order(a, b);
                assert!(first.as_str() < second.as_str());
            }
        }
    }
}
