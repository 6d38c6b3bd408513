//! Static catalogs: gem packs (rubles → gems) and premium items (gems).
//!
//! Immutable reference data with process lifetime. Prices live here and
//! nowhere else; handlers and the reconciler look packs up by id.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A purchasable bundle converting rubles into gems.
#[derive(Debug, Clone)]
pub struct Pack {
    pub rub: u64,
    pub gems: u64,
    pub title: &'static str,
}

/// Пакеты (рубли -> gems)
pub static PACKS: Lazy<HashMap<&'static str, Pack>> = Lazy::new(|| {
    HashMap::from([
        (
            "gems_100",
            Pack {
                rub: 99,
                gems: 100,
                title: "100 Gems",
            },
        ),
        (
            "gems_300",
            Pack {
                rub: 249,
                gems: 320,
                title: "300 Gems (+20)",
            },
        ),
        (
            "gems_600",
            Pack {
                rub: 449,
                gems: 660,
                title: "600 Gems (+60)",
            },
        ),
    ])
});

/// Премиум-товары (цены в Gems)
pub static PREMIUM_ITEMS: Lazy<HashMap<&'static str, u64>> =
    Lazy::new(|| HashMap::from([("aura_neon", 80), ("skin_dragon", 120)]));

/// Looks up a pack by id.
pub fn pack(pack_id: &str) -> Option<&'static Pack> {
    PACKS.get(pack_id)
}

/// Looks up a premium item's gem price by id.
pub fn premium_item_cost(item_id: &str) -> Option<u64> {
    PREMIUM_ITEMS.get(item_id).copied()
}
