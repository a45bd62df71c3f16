use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;

use crate::db_types::OrderNumber;

const ORDER_NUMBER_PREFIX: &str = "ORD-";

/// Generates a fresh order number: `ORD-` followed by 8 random upper-case hex digits.
///
/// Uniqueness is enforced by the database. Callers must be prepared to retry on the (rare) collision.
pub fn generate_order_number() -> OrderNumber {
    let n: u32 = rand::thread_rng().gen();
    OrderNumber(format!("{ORDER_NUMBER_PREFIX}{n:08X}"))
}

/// True if `s` is exactly an order number in the form that [`generate_order_number`] produces.
pub fn is_valid_order_number(s: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ORD-[0-9A-F]{8}$").expect("order number regex is valid")).is_match(s)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn generated_numbers_are_well_formed() {
        for _ in 0..100 {
            let n = generate_order_number();
            let digits = n.as_str().strip_prefix(ORDER_NUMBER_PREFIX).expect("Missing prefix");
            assert_eq!(digits.len(), 8);
            assert!(digits.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)), "{n}");
            assert!(is_valid_order_number(n.as_str()));
        }
    }
}
