pub mod cart_service;
pub mod order_service;
pub mod payment_service;
pub mod product_service;
pub mod seller_service;
pub mod voucher_service;
