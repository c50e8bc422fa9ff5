pub mod pass_sale;
pub mod record;
