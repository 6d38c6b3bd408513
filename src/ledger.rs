//! In-memory gem ledger: per-user balance and owned premium items.
//!
//! Demo storage with process lifetime. All mutations go through this type;
//! nothing else holds the user map. Swap the internals for a database to
//! persist — call sites only see `Ledger`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-user account: gem balance and owned premium item ids.
#[derive(Debug, Clone, Default)]
struct Account {
    gems: u64,
    premium_items: HashSet<String>,
}

/// Outcome of a premium-item purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purchase {
    /// Balance was sufficient; cost deducted, item added.
    Completed {
        gems: u64,
        premium_items: Vec<String>,
    },
    /// Balance below cost; nothing changed.
    InsufficientFunds,
}

/// In-memory ledger keyed by Telegram user id.
///
/// Accounts are auto-vivified with zero balance and no items on first
/// touch. Every check-and-mutate sequence runs under one lock guard with
/// no await point inside, so mutations for the same user never interleave.
#[derive(Clone)]
pub struct Ledger {
    users: Arc<Mutex<HashMap<i64, Account>>>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current balance and owned items (sorted for stable responses).
    pub async fn balance(&self, uid: i64) -> (u64, Vec<String>) {
        let mut users = self.users.lock().await;
        let account = users.entry(uid).or_default();
        let mut items: Vec<String> = account.premium_items.iter().cloned().collect();
        items.sort();
        (account.gems, items)
    }

    /// Credits `amount` gems and returns the new balance.
    ///
    /// Callers enforce their own sanity bounds (the admin grant endpoint
    /// caps at `config::grant::MAX_GRANT_GEMS`); the ledger itself only
    /// rejects a zero amount.
    pub async fn credit(&self, uid: i64, amount: u64) -> u64 {
        debug_assert!(amount > 0, "credit amount must be positive");
        let mut users = self.users.lock().await;
        let account = users.entry(uid).or_default();
        account.gems = account.gems.saturating_add(amount);
        log::info!("Credited {} gems to user {} (balance: {})", amount, uid, account.gems);
        account.gems
    }

    /// Atomically checks the balance and buys `item_id` for `cost` gems.
    ///
    /// Re-buying an already-owned item is not prevented; the set insert is
    /// a no-op but the cost is deducted again.
    pub async fn purchase(&self, uid: i64, item_id: &str, cost: u64) -> Purchase {
        let mut users = self.users.lock().await;
        let account = users.entry(uid).or_default();

        if account.gems < cost {
            return Purchase::InsufficientFunds;
        }

        account.gems -= cost;
        account.premium_items.insert(item_id.to_string());

        let mut items: Vec<String> = account.premium_items.iter().cloned().collect();
        items.sort();
        Purchase::Completed {
            gems: account.gems,
            premium_items: items,
        }
    }
}
