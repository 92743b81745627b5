pub mod company_meta;
pub mod model_meta;
pub mod order;
pub mod order_item;
pub mod part;
pub mod review;
pub mod shop;
pub mod user;
