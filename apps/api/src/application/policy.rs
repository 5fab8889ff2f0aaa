//! Role -> capability mapping.
//!
//! Handlers ask for a capability instead of comparing roles, so the whole
//! permission matrix lives here.

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::user::{Role, User},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    BrowseCatalog,
    ManageOwnStore,
    ManageOwnProducts,
    ManagePromotions,
    PurchaseSubscription,
    ReviewStores,
    ReviewDocuments,
    ReviewSubscriptions,
    ManagePlans,
    ManageCategories,
    ManageUsers,
    ManageSettings,
    ViewReports,
}

const BUYER: &[Capability] = &[Capability::BrowseCatalog];

const SELLER: &[Capability] = &[
    Capability::BrowseCatalog,
    Capability::ManageOwnStore,
    Capability::ManageOwnProducts,
    Capability::ManagePromotions,
    Capability::PurchaseSubscription,
];

const SUPER_ADMIN: &[Capability] = &[
    Capability::BrowseCatalog,
    Capability::ReviewStores,
    Capability::ReviewDocuments,
    Capability::ReviewSubscriptions,
    Capability::ManagePlans,
    Capability::ManageCategories,
    Capability::ManageUsers,
    Capability::ManageSettings,
    Capability::ViewReports,
];

pub fn capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Buyer => BUYER,
        Role::Seller => SELLER,
        Role::SuperAdmin => SUPER_ADMIN,
    }
}

pub fn allows(role: Role, capability: Capability) -> bool {
    capabilities(role).contains(&capability)
}

/// Fails with `Forbidden` unless the user's role grants `capability`.
pub fn require(user: &User, capability: Capability) -> AppResult<()> {
    if allows(user.role, capability) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %user.id,
            role = %user.role,
            capability = ?capability,
            "Capability check failed"
        );
        Err(AppError::Forbidden)
    }
}
