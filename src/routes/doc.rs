use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, CreateAddressRequest},
        cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartItemRequest},
        orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        payments::{
            CallbackAck, InitiatePaymentRequest, InitiatePaymentResponse, PaymentStatusResponse,
        },
        products::{CreateProductRequest, ProductList},
        vouchers::{PurchaseVoucherRequest, VoucherList},
    },
    models::{Address, CartItem, Order, OrderItem, PaymentTransaction, Product, Voucher},
    response::{ApiResponse, Meta},
    routes::{
        addresses, cart, health, health::HealthData, orders, params, payments, products, seller,
        vouchers,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        products::create_product,
        addresses::list_addresses,
        addresses::create_address,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        seller::list_seller_orders,
        seller::update_order_status,
        payments::initiate_payment,
        payments::payment_callback,
        payments::payment_status,
        vouchers::purchase_voucher,
        vouchers::list_vouchers
    ),
    components(
        schemas(
            Product,
            Address,
            CartItem,
            Order,
            OrderItem,
            Voucher,
            PaymentTransaction,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartItemDto,
            CartList,
            CreateAddressRequest,
            AddressList,
            CheckoutRequest,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            InitiatePaymentRequest,
            InitiatePaymentResponse,
            CallbackAck,
            PaymentStatusResponse,
            PurchaseVoucherRequest,
            VoucherList,
            CreateProductRequest,
            ProductList,
            params::Pagination,
            params::OrderListQuery,
            HealthData,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CartList>,
            ApiResponse<VoucherList>,
            ApiResponse<PaymentStatusResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Addresses", description = "Shipping address endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order endpoints"),
        (name = "Seller", description = "Seller fulfilment endpoints"),
        (name = "Payments", description = "Payment gateway endpoints"),
        (name = "Vouchers", description = "Voucher endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
