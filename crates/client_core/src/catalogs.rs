//! Filter catalogs for the back-office list screens.

use shared::domain::FilterKind;

use crate::filters::{FilterCatalog, FilterSpec, Resolver};

pub const ORDER_STATUSES: &[(i64, &str)] = &[
    (1, "Pending"),
    (2, "Payment failed"),
    (3, "Under packaging"),
    (4, "Packaged"),
    (5, "Shipped to customer"),
    (6, "Shipped to store"),
    (7, "In store"),
    (8, "Delivered"),
    (9, "Canceled"),
    (10, "Refund requested"),
    (11, "Refunded"),
    (16, "Incidence"),
];

pub const CUSTOMER_GROUPS: &[(i64, &str)] = &[(2, "Employee"), (1, "Loyalty"), (3, "Guest")];

pub const PAYMENT_METHODS: &[(i64, &str)] = &[
    (4, "Apple Pay"),
    (3, "Google Pay"),
    (8, "Klarna - Pay Over Time"),
    (9, "Klarna - Pay Later"),
    (5, "MBWay"),
    (2, "Multibanco"),
    (12, "Oney - FacilyPay 3X"),
    (11, "Oney - FacilyPay 4X"),
    (15, "Oney - FacilyPay 6X"),
    (16, "Oney - FacilyPay 10X"),
    (17, "Oney - FacilyPay 12X"),
    (6, "Paypal"),
    (13, "Credit card - American Express"),
    (10, "Credit card - Mastercard"),
    (1, "Credit card - Visa"),
];

pub const SHIPMENT_TYPES: &[(&str, &str)] =
    &[("pickup", "Store pickup"), ("delivery", "Home delivery")];

/// Orders screen, with store names unresolved (ids shown as-is).
pub fn orders_catalog() -> FilterCatalog {
    orders_catalog_with_stores(Vec::new(), Vec::new())
}

/// Orders screen with store and pickup-store names fetched from the backend.
///
/// Pickup stores are keyed by their ERP id, regular stores by numeric id.
pub fn orders_catalog_with_stores(
    stores: Vec<(i64, String)>,
    pickup_stores: Vec<(String, String)>,
) -> FilterCatalog {
    FilterCatalog::new()
        .with("search", FilterSpec::new("Search", FilterKind::Text))
        .with("erpId", FilterSpec::new("ERP ID", FilterKind::Text))
        .with(
            "statusId",
            FilterSpec::new("Status", FilterKind::Id)
                .with_resolver(Resolver::options(ORDER_STATUSES.iter().copied())),
        )
        .with(
            "storeId",
            FilterSpec::new("Store", FilterKind::Id).with_resolver(Resolver::options(stores)),
        )
        .with(
            "groupId",
            FilterSpec::new("Group", FilterKind::Id)
                .with_resolver(Resolver::options(CUSTOMER_GROUPS.iter().copied())),
        )
        .with(
            "paymentMethodId",
            FilterSpec::new("Payment method", FilterKind::Id)
                .with_resolver(Resolver::options(PAYMENT_METHODS.iter().copied())),
        )
        .with("email", FilterSpec::new("Email", FilterKind::Text))
        .with(
            "pickupStoreId",
            FilterSpec::new("Pickup store", FilterKind::Text)
                .with_resolver(Resolver::options(pickup_stores)),
        )
        .with("name", FilterSpec::new("Name", FilterKind::Text))
        .with(
            "shipmentType",
            FilterSpec::new("Shipment type", FilterKind::Text)
                .with_resolver(Resolver::options(SHIPMENT_TYPES.iter().copied())),
        )
        .with("createdFrom", FilterSpec::new("From", FilterKind::Date))
        .with("createdTo", FilterSpec::new("To", FilterKind::Date))
}

pub fn returns_catalog() -> FilterCatalog {
    FilterCatalog::new()
        .with("orderNumber", FilterSpec::new("Order number", FilterKind::Text))
        .with(
            "createdAt",
            FilterSpec::new("Created", FilterKind::Date).accepting(FilterKind::Range),
        )
        .with("statusId", FilterSpec::new("Status", FilterKind::Id))
        .with("storeId", FilterSpec::new("Store", FilterKind::Id))
        .with("customerId", FilterSpec::new("Customer", FilterKind::Id))
}

pub fn customers_catalog() -> FilterCatalog {
    FilterCatalog::new()
        .with("search", FilterSpec::new("Search", FilterKind::Text))
        .with("name", FilterSpec::new("Name", FilterKind::Text))
        .with("email", FilterSpec::new("Email", FilterKind::Text))
        .with("phone", FilterSpec::new("Phone", FilterKind::Text))
        .with(
            "groupId",
            FilterSpec::new("Group", FilterKind::Id)
                .with_resolver(Resolver::options(CUSTOMER_GROUPS.iter().copied())),
        )
        .with("storeId", FilterSpec::new("Store", FilterKind::Id))
        .with("ids", FilterSpec::new("Customers", FilterKind::Multi))
}

pub fn home_layouts_catalog() -> FilterCatalog {
    FilterCatalog::new().with("status", FilterSpec::new("Status", FilterKind::Text))
}
