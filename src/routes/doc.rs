use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{
        bowl::BowlCustomization,
        cart::CartItem,
        order::{Order, OrderStatus},
        payments::{CreditInfo, PaymentAllocation, PaymentMethod, PaymentState},
        summary::SalesSummary,
    },
    dto::{
        cart::{CartQuote, QuoteRequest, QuotedLine},
        credits::{CreditBalance, CreditOrderRef},
        menu::{CreateMenuItemRequest, MenuList, UpdateMenuItemRequest},
        orders::{
            AssignCreditRequest, CreateOrderRequest, OrderHistory, OrderLineRequest, OrderList,
            OrderView, RecordPaymentRequest, UpdateOrderRequest,
        },
    },
    models::{AuditEntry, MenuItem},
    response::{ApiResponse, Meta},
    routes::{cart, credits, health, menu, orders, params},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        menu::list_menu,
        menu::create_menu_item,
        menu::get_menu_item,
        menu::update_menu_item,
        cart::quote_cart,
        orders::list_orders,
        orders::create_order,
        orders::sales_summary,
        orders::get_order,
        orders::update_order,
        orders::order_history,
        orders::record_payment,
        orders::assign_credit,
        orders::settle_credit,
        credits::employee_balance
    ),
    components(
        schemas(
            MenuItem,
            AuditEntry,
            BowlCustomization,
            CartItem,
            Order,
            OrderStatus,
            PaymentMethod,
            PaymentAllocation,
            PaymentState,
            CreditInfo,
            SalesSummary,
            CartQuote,
            QuoteRequest,
            QuotedLine,
            CreditBalance,
            CreditOrderRef,
            CreateMenuItemRequest,
            UpdateMenuItemRequest,
            MenuList,
            OrderLineRequest,
            CreateOrderRequest,
            UpdateOrderRequest,
            RecordPaymentRequest,
            AssignCreditRequest,
            OrderView,
            OrderList,
            OrderHistory,
            params::SortOrder,
            health::HealthData,
            Meta,
            ApiResponse<MenuItem>,
            ApiResponse<MenuList>,
            ApiResponse<OrderView>,
            ApiResponse<OrderList>,
            ApiResponse<SalesSummary>,
            ApiResponse<CreditBalance>,
            ApiResponse<CartQuote>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Menu", description = "Menu catalog endpoints"),
        (name = "Cart", description = "Cart pricing endpoints"),
        (name = "Orders", description = "Order lifecycle endpoints"),
        (name = "Payments", description = "Payment and employee credit endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
