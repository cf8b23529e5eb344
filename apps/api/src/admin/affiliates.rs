//! Affiliate referral statistics for the admin dashboard.

use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::models::catalog::{AffiliateRow, ReferralRow};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffiliateStats {
    pub affiliate_id: Uuid,
    pub code: String,
    pub commission_rate: f64,
    pub referrals: u32,
    pub conversions: u32,
    /// Conversions / referrals in percent, two decimals. 0 without referrals.
    pub conversion_rate: f64,
    pub earnings_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AffiliateTotals {
    pub referrals: u32,
    pub conversions: u32,
    pub conversion_rate: f64,
    pub earnings_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffiliateReport {
    pub affiliates: Vec<AffiliateStats>,
    pub totals: AffiliateTotals,
}

fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (f64::from(part) * 10_000.0 / f64::from(whole)).round() / 100.0
}

/// Only converted referrals earn commission. Referrals pointing at unknown
/// affiliates are ignored. Sorted by earnings desc, then code.
pub fn aggregate(affiliates: &[AffiliateRow], referrals: &[ReferralRow]) -> AffiliateReport {
    let mut by_id: HashMap<Uuid, AffiliateStats> = affiliates
        .iter()
        .map(|a| {
            (
                a.id,
                AffiliateStats {
                    affiliate_id: a.id,
                    code: a.code.clone(),
                    commission_rate: a.commission_rate,
                    referrals: 0,
                    conversions: 0,
                    conversion_rate: 0.0,
                    earnings_cents: 0,
                },
            )
        })
        .collect();

    for referral in referrals {
        let Some(stats) = by_id.get_mut(&referral.affiliate_id) else {
            continue;
        };
        stats.referrals += 1;
        if referral.converted {
            stats.conversions += 1;
            stats.earnings_cents += referral.commission_cents.max(0);
        }
    }

    let mut rows: Vec<AffiliateStats> = by_id.into_values().collect();
    let mut totals = AffiliateTotals::default();
    for stats in &mut rows {
        stats.conversion_rate = percent(stats.conversions, stats.referrals);
        totals.referrals += stats.referrals;
        totals.conversions += stats.conversions;
        totals.earnings_cents += stats.earnings_cents;
    }
    totals.conversion_rate = percent(totals.conversions, totals.referrals);
    rows.sort_by(|a, b| {
        b.earnings_cents
            .cmp(&a.earnings_cents)
            .then_with(|| a.code.cmp(&b.code))
    });

    AffiliateReport {
        affiliates: rows,
        totals,
    }
}

/// GET /api/v1/admin/affiliates/stats
pub async fn handle_affiliate_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<AffiliateReport>, AppError> {
    let affiliates =
        sqlx::query_as::<_, AffiliateRow>("SELECT id, user_id, code, commission_rate FROM affiliates")
            .fetch_all(&state.db)
            .await?;
    let referrals = sqlx::query_as::<_, ReferralRow>(
        "SELECT affiliate_id, converted, commission_cents FROM affiliate_referrals",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(aggregate(&affiliates, &referrals)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn affiliate(code: &str) -> AffiliateRow {
        AffiliateRow {
            id: Uuid::new_v4(),
            user_id: None,
            code: code.to_string(),
            commission_rate: 0.1,
        }
    }

    fn referral(affiliate: &AffiliateRow, converted: bool, cents: i64) -> ReferralRow {
        ReferralRow {
            affiliate_id: affiliate.id,
            converted,
            commission_cents: cents,
        }
    }

    #[test]
    fn test_aggregate_per_affiliate_and_totals() {
        let campus = affiliate("CAMPUS10");
        let mentor = affiliate("MENTOR15");
        let referrals = vec![
            referral(&campus, true, 1500),
            referral(&campus, false, 0),
            referral(&campus, true, 1500),
            referral(&mentor, false, 0),
            referral(&mentor, false, 999),
        ];
        let report = aggregate(&[mentor.clone(), campus.clone()], &referrals);

        assert_eq!(report.affiliates[0].code, "CAMPUS10");
        assert_eq!(report.affiliates[0].referrals, 3);
        assert_eq!(report.affiliates[0].conversions, 2);
        assert_eq!(report.affiliates[0].conversion_rate, 66.67);
        assert_eq!(report.affiliates[0].earnings_cents, 3000);

        // Unconverted referrals never earn, whatever the stored amount.
        assert_eq!(report.affiliates[1].earnings_cents, 0);
        assert_eq!(report.affiliates[1].conversion_rate, 0.0);

        assert_eq!(
            report.totals,
            AffiliateTotals {
                referrals: 5,
                conversions: 2,
                conversion_rate: 40.0,
                earnings_cents: 3000,
            }
        );
    }

    #[test]
    fn test_affiliate_without_referrals() {
        let report = aggregate(&[affiliate("NEW")], &[]);
        assert_eq!(report.affiliates.len(), 1);
        assert_eq!(report.affiliates[0].conversion_rate, 0.0);
        assert_eq!(report.totals, AffiliateTotals::default());
    }

    #[test]
    fn test_orphan_referrals_ignored() {
        let known = affiliate("KNOWN");
        let stray = ReferralRow {
            affiliate_id: Uuid::new_v4(),
            converted: true,
            commission_cents: 500,
        };
        let report = aggregate(&[known], &[stray]);
        assert_eq!(report.totals.referrals, 0);
        assert_eq!(report.totals.earnings_cents, 0);
    }
}
