//! Bonus Redemption
//!
//! Bonuses are the loyalty balance, counted in minor units of the cart currency. A redemption is
//! recomputed on every pricing pass and is clamped rather than rejected.

/// Share of the post-discount amount that bonuses may cover, in percent.
pub const BONUS_CAP_PERCENT: i64 = 70;

/// Largest redemption allowed against `post_discount_minor`, i.e. `floor(post_discount × 0.7)`.
pub fn max_bonuses(post_discount_minor: i64) -> i64 {
    let post_discount = i128::from(post_discount_minor.max(0));
    let cap = post_discount * i128::from(BONUS_CAP_PERCENT) / 100;

    i64::try_from(cap).unwrap_or(i64::MAX)
}

/// `min(requested, max_bonuses(post_discount), available)`.
pub fn redeemable_bonuses(post_discount_minor: i64, requested: u64, available: u64) -> i64 {
    let requested = i64::try_from(requested).unwrap_or(i64::MAX);
    let available = i64::try_from(available).unwrap_or(i64::MAX);

    requested
        .min(available)
        .min(max_bonuses(post_discount_minor))
}
