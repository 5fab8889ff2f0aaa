pub mod category;
pub mod document;
pub mod featured_product;
pub mod hot_deal;
pub mod product;
pub mod promotion;
pub mod site_setting;
pub mod store;
pub mod subscription;
pub mod subscription_plan;
pub mod user;
