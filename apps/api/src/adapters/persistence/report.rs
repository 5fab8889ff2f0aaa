use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Row};

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    use_cases::report::{
        ProductCounts, PromotionCounts, ReportOverview, ReportPeriod, ReportRepo, StoreCounts,
        SubscriptionCounts, UserCounts,
    },
};

#[async_trait]
impl ReportRepo for PostgresPersistence {
    async fn overview(&self, period: ReportPeriod) -> AppResult<ReportOverview> {
        let snapshot = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE role = 'buyer') AS buyers,
                (SELECT COUNT(*) FROM users WHERE role = 'seller') AS sellers,
                (SELECT COUNT(*) FROM users WHERE status = 'banned') AS banned,
                (SELECT COUNT(*) FROM stores WHERE status = 'pending') AS stores_pending,
                (SELECT COUNT(*) FROM stores WHERE status = 'verified') AS stores_verified,
                (SELECT COUNT(*) FROM stores WHERE status = 'rejected') AS stores_rejected,
                (SELECT COUNT(*) FROM stores WHERE status = 'suspended') AS stores_suspended,
                (SELECT COUNT(*) FROM store_documents WHERE status = 'pending') AS pending_documents,
                (SELECT COUNT(*) FROM products) AS products_total,
                (SELECT COUNT(*) FROM products WHERE status = 'published') AS products_published,
                (SELECT COUNT(*) FROM subscriptions WHERE status = 'pending') AS subs_pending,
                (SELECT COUNT(*) FROM subscriptions WHERE status = 'active') AS subs_active,
                (SELECT COUNT(*) FROM featured_products WHERE is_active) AS active_featured,
                (SELECT COUNT(*) FROM hot_deals WHERE is_active) AS active_hot_deals
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)?;

        // Approved cycles keep `reviewed_at`; superseded requests never had one.
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT \
                COUNT(*) AS approved, \
                COALESCE(SUM(amount_cents), 0)::BIGINT AS approved_revenue_cents \
             FROM subscriptions \
             WHERE status IN ('active', 'expired') AND reviewed_at IS NOT NULL",
        );
        if let Some(from) = period.from {
            builder.push(" AND reviewed_at >= ").push_bind(from);
        }
        if let Some(to) = period.to {
            builder.push(" AND reviewed_at <= ").push_bind(to);
        }
        let revenue = builder
            .build()
            .fetch_one(self.pool())
            .await
            .map_err(AppError::from)?;

        Ok(ReportOverview {
            users: UserCounts {
                buyers: snapshot.get("buyers"),
                sellers: snapshot.get("sellers"),
                banned: snapshot.get("banned"),
            },
            stores: StoreCounts {
                pending: snapshot.get("stores_pending"),
                verified: snapshot.get("stores_verified"),
                rejected: snapshot.get("stores_rejected"),
                suspended: snapshot.get("stores_suspended"),
            },
            pending_documents: snapshot.get("pending_documents"),
            products: ProductCounts {
                total: snapshot.get("products_total"),
                published: snapshot.get("products_published"),
            },
            subscriptions: SubscriptionCounts {
                pending: snapshot.get("subs_pending"),
                active: snapshot.get("subs_active"),
                approved: revenue.get("approved"),
                approved_revenue_cents: revenue.get("approved_revenue_cents"),
            },
            promotions: PromotionCounts {
                active_featured: snapshot.get("active_featured"),
                active_hot_deals: snapshot.get("active_hot_deals"),
            },
        })
    }
}
