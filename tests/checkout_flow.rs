use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    Statement,
};
use uuid::Uuid;

use zirvana_commerce_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cart::AddToCartRequest,
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
        payments::InitiatePaymentRequest,
        vouchers::PurchaseVoucherRequest,
    },
    entity::{
        addresses::ActiveModel as AddressActive,
        cart_items::{Column as CartCol, Entity as CartItems},
        categories::ActiveModel as CategoryActive,
        orders::Entity as Orders,
        products::{ActiveModel as ProductActive, Entity as Products},
        users::ActiveModel as UserActive,
    },
    error::AppError,
    gateway::StatusFieldVerifier,
    middleware::auth::AuthUser,
    services::{cart_service, order_service, payment_service, seller_service, voucher_service},
    settings::PlatformSettings,
    state::AppState,
    tokens::UuidTokens,
};

// Full journey: cart -> checkout -> payment -> seller fulfilment, plus the
// voucher and stock failure paths. Runs as one test so the table truncation
// at setup cannot race another flow.
#[tokio::test]
async fn checkout_payment_and_fulfilment_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let buyer_id = create_user(&state, "user", "buyer@example.com").await?;
    let seller_id = create_user(&state, "seller", "seller@example.com").await?;
    let buyer = AuthUser {
        user_id: buyer_id,
        role: "user".into(),
    };
    let seller = AuthUser {
        user_id: seller_id,
        role: "seller".into(),
    };

    let category_id = create_category(&state, "Electronics", dec!(18)).await?;
    let address_id = create_address(&state, buyer_id).await?;

    // --- Plain checkout: totals, stock decrement, cart cleared -------------

    let widget = create_product(
        &state,
        seller_id,
        category_id,
        "Widget",
        dec!(100),
        10,
        false,
        Decimal::ZERO,
    )
    .await?;

    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: widget,
            qty: 2,
        },
    )
    .await?;

    let resp = order_service::checkout(
        &state,
        &buyer,
        CheckoutRequest {
            address_id,
            voucher_code: None,
        },
    )
    .await?;
    let order = resp.data.unwrap().order;

    assert_eq!(order.subtotal, dec!(200));
    assert_eq!(order.gst_amount, dec!(36));
    assert_eq!(order.deposit_amount, dec!(236));
    assert_eq!(order.remaining_due, Decimal::ZERO);
    assert_eq!(order.discount_amount, Decimal::ZERO);
    assert_eq!(order.commission, dec!(10));
    assert_eq!(order.status, "pending");
    assert!(!order.is_preorder_order);
    assert!(order.shipping_address.is_some());

    let stock_after = Products::find_by_id(widget)
        .one(&state.orm)
        .await?
        .unwrap()
        .stock;
    assert_eq!(stock_after, 8);

    let cart_left = CartItems::find()
        .filter(CartCol::UserId.eq(buyer_id))
        .count(&state.orm)
        .await?;
    assert_eq!(cart_left, 0);

    // --- Payment: initiate, failed callback, retry, success, replay -------

    let err = payment_service::initiate_payment(
        &state,
        &buyer,
        InitiatePaymentRequest {
            order_id: order.id,
            gateway: "cashfree".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let initiated = payment_service::initiate_payment(
        &state,
        &buyer,
        InitiatePaymentRequest {
            order_id: order.id,
            gateway: "razorpay".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(initiated.amount, dec!(236));
    assert!(initiated.transaction_id.starts_with("RAZORPAY_"));

    let failed = payment_service::handle_callback(
        &state,
        "razorpay",
        serde_json::json!({
            "transaction_id": initiated.transaction_id,
            "status": "failure",
        }),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(failed.status, "failed");

    // A failed attempt leaves the order payable; a new attempt gets a new
    // transaction row.
    let retry = payment_service::initiate_payment(
        &state,
        &buyer,
        InitiatePaymentRequest {
            order_id: order.id,
            gateway: "razorpay".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_ne!(retry.transaction_id, initiated.transaction_id);

    let paid = payment_service::handle_callback(
        &state,
        "razorpay",
        serde_json::json!({
            "transaction_id": retry.transaction_id,
            "status": "success",
        }),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(paid.status, "success");

    let order_row = Orders::find_by_id(order.id).one(&state.orm).await?.unwrap();
    assert_eq!(order_row.status, "paid");
    assert_eq!(order_row.payment_status, "completed");

    // Gateways retry callbacks; a replay must return the stored outcome
    // without changing anything.
    let replay = payment_service::handle_callback(
        &state,
        "razorpay",
        serde_json::json!({
            "transaction_id": retry.transaction_id,
            "status": "success",
        }),
    )
    .await?;
    assert_eq!(replay.message, "Callback already processed");
    assert_eq!(replay.data.unwrap().status, "success");

    let err = payment_service::initiate_payment(
        &state,
        &buyer,
        InitiatePaymentRequest {
            order_id: order.id,
            gateway: "razorpay".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::AlreadyPaid));

    // --- Seller fulfilment -------------------------------------------------

    let err = seller_service::update_order_status(
        &state,
        &seller,
        order.id,
        UpdateOrderStatusRequest {
            status: "refunded".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidStatus(_)));

    let err = seller_service::update_order_status(
        &state,
        &buyer,
        order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let shipped = seller_service::update_order_status(
        &state,
        &seller,
        order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(shipped.status, "shipped");
    assert!(shipped.shipped_at.is_some());

    // --- Voucher: discount applies once, excess is forfeited ---------------

    let voucher = voucher_service::purchase_voucher(
        &state,
        &buyer,
        PurchaseVoucherRequest { value: dec!(300) },
    )
    .await?
    .data
    .unwrap();

    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: widget,
            qty: 2,
        },
    )
    .await?;

    let discounted = order_service::checkout(
        &state,
        &buyer,
        CheckoutRequest {
            address_id,
            voucher_code: Some(voucher.code.clone()),
        },
    )
    .await?
    .data
    .unwrap()
    .order;

    // Voucher 300 against a 236 deposit: nothing payable now, and the excess
    // does not reduce the remainder.
    assert_eq!(discounted.discount_amount, dec!(300));
    assert_eq!(discounted.deposit_amount, Decimal::ZERO);
    assert_eq!(discounted.remaining_due, dec!(236));

    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: widget,
            qty: 1,
        },
    )
    .await?;
    let err = order_service::checkout(
        &state,
        &buyer,
        CheckoutRequest {
            address_id,
            voucher_code: Some(voucher.code),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidVoucher));
    cart_service::clear_cart(&state, &buyer).await?;

    // --- Insufficient stock aborts the whole checkout ----------------------

    let scarce = create_product(
        &state,
        seller_id,
        category_id,
        "Scarce",
        dec!(50),
        1,
        false,
        Decimal::ZERO,
    )
    .await?;
    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: scarce,
            qty: 2,
        },
    )
    .await?;

    let orders_before = Orders::find().count(&state.orm).await?;
    let err = order_service::checkout(
        &state,
        &buyer,
        CheckoutRequest {
            address_id,
            voucher_code: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));

    let stock = Products::find_by_id(scarce)
        .one(&state.orm)
        .await?
        .unwrap()
        .stock;
    assert_eq!(stock, 1, "failed checkout must not consume stock");
    let orders_after = Orders::find().count(&state.orm).await?;
    assert_eq!(orders_before, orders_after);
    let cart_left = CartItems::find()
        .filter(CartCol::UserId.eq(buyer_id))
        .count(&state.orm)
        .await?;
    assert_eq!(cart_left, 1, "failed checkout must keep the cart");
    cart_service::clear_cart(&state, &buyer).await?;

    // --- Pre-order: deposit now, remainder later, no stock needed ----------

    let preorder = create_product(
        &state,
        seller_id,
        category_id,
        "Preorder Console",
        dec!(400),
        0,
        true,
        dec!(50),
    )
    .await?;

    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: widget,
            qty: 1,
        },
    )
    .await?;
    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: preorder,
            qty: 1,
        },
    )
    .await?;

    let mixed = order_service::checkout(
        &state,
        &buyer,
        CheckoutRequest {
            address_id,
            voucher_code: None,
        },
    )
    .await?
    .data
    .unwrap();

    // Standard line pays 118 now; the pre-order line pays its 50 deposit.
    assert!(mixed.order.is_preorder_order);
    assert_eq!(mixed.order.subtotal, dec!(500));
    assert_eq!(mixed.order.gst_amount, dec!(90));
    assert_eq!(mixed.order.deposit_amount, dec!(168));
    assert_eq!(mixed.order.remaining_due, dec!(422));
    assert!(mixed.items.iter().any(|i| i.is_prebook));

    let preorder_stock = Products::find_by_id(preorder)
        .one(&state.orm)
        .await?
        .unwrap()
        .stock;
    assert_eq!(preorder_stock, 0, "pre-order lines never touch stock");

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE payment_transactions, order_items, orders, cart_items, vouchers, \
         addresses, products, categories, audit_logs, platform_settings, users \
         RESTART IDENTITY CASCADE",
    ))
    .await?;

    let settings = PlatformSettings::load(&orm).await?;

    Ok(AppState {
        pool,
        orm,
        settings: Arc::new(settings),
        verifier: Arc::new(StatusFieldVerifier),
        tokens: Arc::new(UuidTokens),
    })
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Test User".into()),
        email: Set(email.to_string()),
        phone: Set(Some("9999999999".into())),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_category(
    state: &AppState,
    name: &str,
    gst_rate: Decimal,
) -> anyhow::Result<Uuid> {
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        slug: Set(name.to_lowercase()),
        gst_rate: Set(gst_rate),
    }
    .insert(&state.orm)
    .await?;

    Ok(category.id)
}

#[allow(clippy::too_many_arguments)]
async fn create_product(
    state: &AppState,
    seller_id: Uuid,
    category_id: Uuid,
    title: &str,
    price: Decimal,
    stock: i32,
    is_preorder: bool,
    preorder_deposit: Decimal,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(seller_id),
        category_id: Set(Some(category_id)),
        title: Set(title.into()),
        description: Set(None),
        price: Set(price),
        mrp: Set(price),
        stock: Set(stock),
        is_preorder: Set(is_preorder),
        preorder_deposit: Set(preorder_deposit),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

async fn create_address(state: &AppState, user_id: Uuid) -> anyhow::Result<Uuid> {
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        line1: Set("221B Baker Street".into()),
        line2: Set(None),
        city: Set("Mumbai".into()),
        state: Set("MH".into()),
        pincode: Set("400001".into()),
        address_type: Set("home".into()),
        is_default: Set(true),
    }
    .insert(&state.orm)
    .await?;

    Ok(address.id)
}
