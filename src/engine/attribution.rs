//! IL / fee / PnL attribution against a hold-the-assets counterfactual.
//!
//! For a constant-product pool whose price ratio moved by `r`, a position
//! without fees is worth `multiplier(r) = 2·√r / (1 + r)` of holding. The
//! decomposition is
//!
//! ```text
//! pure IL   = hodl × (multiplier − 1)
//! fees      = position − hodl × multiplier
//! net PnL   = position − hodl = pure IL + fees
//! ```

use crate::domain::{CurrentSnapshot, EntryBaseline, Metrics, TimeMs};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;
const YEAR_MS: f64 = 365.0 * DAY_MS;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributionError {
    #[error("Entry baseline has non-positive amounts ({token0}, {token1})")]
    NonPositiveEntry { token0: f64, token1: f64 },
    #[error("Current snapshot has an invalid {0}")]
    InvalidCurrent(&'static str),
}

/// Value of an unhedged pool position relative to holding, for a price
/// ratio change `r`. Degenerate ratios (zero, negative, not finite) count
/// as no change.
pub fn il_multiplier(r: f64) -> f64 {
    if !r.is_finite() || r <= 0.0 {
        return 1.0;
    }
    2.0 * r.sqrt() / (1.0 + r)
}

pub fn pure_il_percent(r: f64) -> f64 {
    il_multiplier(r) - 1.0
}

/// `x / hodl`, or 0 when there is nothing to compare against.
fn relative(x: f64, hodl: f64) -> f64 {
    if hodl > 0.0 {
        x / hodl
    } else {
        0.0
    }
}

/// Compound the realized return over the holding period into a yearly rate.
fn annualized_return(net_pnl_percent: f64, time_in_pool_ms: i64) -> Option<f64> {
    if time_in_pool_ms <= 0 {
        return None;
    }
    let years = time_in_pool_ms as f64 / YEAR_MS;
    let rate = (1.0 + net_pnl_percent.abs()).powf(1.0 / years) - 1.0;
    let signed = if net_pnl_percent >= 0.0 { rate } else { -rate };
    signed.is_finite().then_some(signed)
}

fn check_current(current: &CurrentSnapshot) -> Result<(), AttributionError> {
    let fields = [
        ("token0 amount", current.token0_amount),
        ("token1 amount", current.token1_amount),
        ("reserve0", current.reserve0),
        ("reserve1", current.reserve1),
        ("share", current.share),
        ("token0 price", current.price0),
        ("token1 price", current.price1),
    ];
    match fields.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
        Some((name, _)) => Err(AttributionError::InvalidCurrent(name)),
        None => Ok(()),
    }
}

/// Attribute the change from `entry` to `current` as of `now`.
///
/// All-or-nothing: any invalid input fails the whole computation.
pub fn compute_metrics(
    entry: &EntryBaseline,
    current: &CurrentSnapshot,
    now: TimeMs,
) -> Result<Metrics, AttributionError> {
    let (e0, e1) = (entry.token0_amount, entry.token1_amount);
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !positive(e0) || !positive(e1) {
        return Err(AttributionError::NonPositiveEntry {
            token0: e0,
            token1: e1,
        });
    }
    check_current(current)?;

    let position_value = current.token0_amount * current.price0 + current.token1_amount * current.price1;
    let hodl_value = e0 * current.price0 + e1 * current.price1;

    let entry_ratio = e1 / e0;
    let current_ratio = if current.reserve0 > 0.0 {
        current.reserve1 / current.reserve0
    } else {
        0.0
    };
    let price_ratio_change = current_ratio / entry_ratio;

    let il_multiplier = il_multiplier(price_ratio_change);
    let pure_il_percent = il_multiplier - 1.0;
    let pure_il = hodl_value * pure_il_percent;
    let fees_earned = position_value - hodl_value * il_multiplier;
    let net_pnl = position_value - hodl_value;
    let net_pnl_percent = relative(net_pnl, hodl_value);

    let time_in_pool_ms = entry
        .timestamp
        .map_or(0, |t| (now.as_ms() - t.as_ms()).max(0));

    Ok(Metrics {
        position_value,
        hodl_value,
        net_pnl,
        net_pnl_percent,
        pure_il,
        pure_il_percent,
        fees_earned,
        fees_earned_percent: relative(fees_earned, hodl_value),
        current_token0: current.token0_amount,
        current_token1: current.token1_amount,
        token0_change: current.token0_amount - e0,
        token1_change: current.token1_amount - e1,
        time_in_pool_ms,
        days_in_pool: time_in_pool_ms as f64 / DAY_MS,
        annualized_return: annualized_return(net_pnl_percent, time_in_pool_ms),
        il_multiplier,
        price_ratio_change,
        user_share: current.share,
    })
}

/// Cumulative IL and fees as of one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub timestamp: TimeMs,
    pub pure_il: f64,
    pub fees_earned: f64,
    pub net_pnl: f64,
}

/// One day's change, alongside the running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBreakdown {
    pub date: NaiveDate,
    pub timestamp: TimeMs,
    pub pure_il: f64,
    pub fees_earned: f64,
    pub net_change: f64,
    pub cumulative_il: f64,
    pub cumulative_fees: f64,
    pub cumulative_net: f64,
}

/// Day-over-day deltas of a cumulative series. The first day's delta is
/// its own cumulative value.
pub fn daily_breakdown(snapshots: &[DailySnapshot]) -> Vec<DailyBreakdown> {
    let mut prev: Option<&DailySnapshot> = None;
    snapshots
        .iter()
        .map(|s| {
            let (il, fees) = match prev {
                Some(p) => (s.pure_il - p.pure_il, s.fees_earned - p.fees_earned),
                None => (s.pure_il, s.fees_earned),
            };
            prev = Some(s);
            DailyBreakdown {
                date: s.date,
                timestamp: s.timestamp,
                pure_il: il,
                fees_earned: fees,
                net_change: il + fees,
                cumulative_il: s.pure_il,
                cumulative_fees: s.fees_earned,
                cumulative_net: s.net_pnl,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BaselineOrigin;
    use proptest::prelude::*;

    fn entry(t0: f64, t1: f64, ts: Option<i64>) -> EntryBaseline {
        EntryBaseline {
            token0_amount: t0,
            token1_amount: t1,
            k: t0 * t1,
            timestamp: ts.map(TimeMs::new),
            origin: BaselineOrigin::Aggregate { adds: 1, removes: 0 },
        }
    }

    fn current(r0: f64, r1: f64, share: f64, p0: f64, p1: f64) -> CurrentSnapshot {
        CurrentSnapshot {
            token0_amount: r0 * share,
            token1_amount: r1 * share,
            reserve0: r0,
            reserve1: r1,
            share,
            price0: p0,
            price1: p1,
        }
    }

    #[test]
    fn test_multiplier_edges() {
        assert_eq!(il_multiplier(1.0), 1.0);
        assert_eq!(il_multiplier(0.0), 1.0);
        assert_eq!(il_multiplier(-3.0), 1.0);
        assert_eq!(il_multiplier(f64::NAN), 1.0);
        assert!((il_multiplier(4.0) - 0.8).abs() < 1e-12);
        assert!((pure_il_percent(4.0) + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_price_move_without_fees() {
        // Entry ratio 2000; pool now at ratio 450 with the wallet holding
        // exactly the hold value.
        let e = entry(10.0, 20_000.0, Some(0));
        let c = current(40.0, 18_000.0, 0.5, 1100.0, 1.0);
        let m = compute_metrics(&e, &c, TimeMs::new(DAY_MS as i64)).unwrap();

        assert!((m.position_value - 31_000.0).abs() < 1e-6);
        assert!((m.hodl_value - 31_000.0).abs() < 1e-6);
        assert!(m.pure_il < 0.0);
        assert!((m.fees_earned + m.pure_il).abs() < 1e-6);
        assert!((m.net_pnl - (m.pure_il + m.fees_earned)).abs() < 1e-6);
        assert!((m.price_ratio_change - 0.225).abs() < 1e-12);
        assert_eq!(m.token0_change, 10.0);
        assert_eq!(m.token1_change, -11_000.0);
        assert_eq!(m.days_in_pool, 1.0);
    }

    #[test]
    fn test_non_positive_entry_fails() {
        let c = current(1.0, 1.0, 0.1, 1.0, 1.0);
        for e in [entry(0.0, 1.0, None), entry(1.0, -1.0, None), entry(f64::NAN, 1.0, None)] {
            assert!(matches!(
                compute_metrics(&e, &c, TimeMs::new(0)),
                Err(AttributionError::NonPositiveEntry { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_current_fails() {
        let e = entry(1.0, 1.0, None);
        let c = current(1.0, 1.0, 0.1, f64::INFINITY, 1.0);
        assert_eq!(
            compute_metrics(&e, &c, TimeMs::new(0)),
            Err(AttributionError::InvalidCurrent("token0 price"))
        );
    }

    #[test]
    fn test_zero_reserve_means_no_il() {
        let e = entry(1.0, 1.0, None);
        let c = current(0.0, 5.0, 0.5, 1.0, 1.0);
        let m = compute_metrics(&e, &c, TimeMs::new(0)).unwrap();
        assert_eq!(m.il_multiplier, 1.0);
        assert_eq!(m.pure_il, 0.0);
    }

    #[test]
    fn test_zero_prices_give_zero_relative_figures() {
        let e = entry(1.0, 1.0, Some(0));
        let c = current(2.0, 2.0, 0.5, 0.0, 0.0);
        let m = compute_metrics(&e, &c, TimeMs::new(1000)).unwrap();
        assert_eq!(m.hodl_value, 0.0);
        assert_eq!(m.net_pnl_percent, 0.0);
        assert_eq!(m.fees_earned_percent, 0.0);
    }

    #[test]
    fn test_annualized_return() {
        assert_eq!(annualized_return(0.1, 0), None);
        let one_year = YEAR_MS as i64;
        assert!((annualized_return(0.1, one_year).unwrap() - 0.1).abs() < 1e-12);
        assert!((annualized_return(-0.1, one_year).unwrap() + 0.1).abs() < 1e-12);
        // Half a year at 21% compounds to 46.41% a year.
        assert!((annualized_return(0.21, one_year / 2).unwrap() - 0.4641).abs() < 1e-9);
        // A one-millisecond holding period overflows to infinity.
        assert_eq!(annualized_return(0.5, 1), None);
    }

    #[test]
    fn test_missing_entry_time_has_no_annualized_return() {
        let e = entry(1.0, 1.0, None);
        let c = current(4.0, 4.0, 0.5, 1.0, 1.0);
        let m = compute_metrics(&e, &c, TimeMs::new(1_000_000)).unwrap();
        assert_eq!(m.time_in_pool_ms, 0);
        assert_eq!(m.annualized_return, None);
    }

    #[test]
    fn test_daily_breakdown_deltas() {
        let day = |d: u32, il: f64, fees: f64| DailySnapshot {
            date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            timestamp: TimeMs::new(i64::from(d) * DAY_MS as i64),
            pure_il: il,
            fees_earned: fees,
            net_pnl: il + fees,
        };
        let rows = daily_breakdown(&[day(1, -2.0, 1.0), day(2, -5.0, 4.0), day(3, -4.0, 4.5)]);

        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].pure_il, rows[0].fees_earned), (-2.0, 1.0));
        assert_eq!((rows[1].pure_il, rows[1].fees_earned), (-3.0, 3.0));
        assert_eq!(rows[1].net_change, 0.0);
        assert_eq!((rows[2].pure_il, rows[2].fees_earned), (1.0, 0.5));
        assert_eq!(rows[2].cumulative_il, -4.0);
        assert_eq!(rows[2].cumulative_net, 0.5);
        assert!(daily_breakdown(&[]).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_multiplier_never_exceeds_one(r in 1e-9f64..1e9) {
            let m = il_multiplier(r);
            prop_assert!(m <= 1.0 + 1e-12, "multiplier({}) = {}", r, m);
            prop_assert!(m > 0.0);
        }

        #[test]
        fn prop_multiplier_symmetric_in_inverse(r in 1e-6f64..1e6) {
            prop_assert!((il_multiplier(r) - il_multiplier(1.0 / r)).abs() < 1e-9);
        }

        #[test]
        fn prop_net_pnl_decomposes(
            e0 in 1e-3f64..1e6,
            e1 in 1e-3f64..1e6,
            r0 in 0.0f64..1e7,
            r1 in 0.0f64..1e7,
            share in 0.0f64..1.0,
            p0 in 0.0f64..1e5,
            p1 in 0.0f64..1e5,
        ) {
            let m = compute_metrics(
                &entry(e0, e1, Some(0)),
                &current(r0, r1, share, p0, p1),
                TimeMs::new(DAY_MS as i64 * 30),
            ).unwrap();
            let scale = m.position_value.abs().max(m.hodl_value.abs()).max(1.0);
            prop_assert!((m.net_pnl - (m.pure_il + m.fees_earned)).abs() <= 1e-9 * scale);
            prop_assert!(m.pure_il <= 1e-12 * scale);
        }
    }
}
