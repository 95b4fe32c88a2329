//! Banking topic gate
//!
//! A coarse allow-list: a message is in scope when its lower-cased text
//! contains any keyword as a substring. No tokenization, so "pin" also
//! matches "spinning" and negations still match.

pub const BANK_KEYWORDS: &[&str] = &[
    "account",
    "balance",
    "loan",
    "emi",
    "interest",
    "card",
    "credit",
    "debit",
    "statement",
    "transaction",
    "transfer",
    "upi",
    "imps",
    "neft",
    "rtgs",
    "fd",
    "rd",
    "net banking",
    "netbanking",
    "cheque",
    "branch",
    "ifsc",
    "limit",
    "otp",
    "pin",
    "security",
];

pub fn is_in_scope(text: &str) -> bool {
    let lower = text.to_lowercase();
    BANK_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}
