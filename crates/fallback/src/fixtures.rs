//! Built-in records served while the backend is unreachable.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use orderdesk_core::domain::customer::Customer;
use orderdesk_core::domain::order::{CustomerRef, Order, OrderDetail, OrderStatus, ProductRef};
use orderdesk_core::domain::prediction::SalesPrediction;
use orderdesk_core::domain::product::{Catalog, Product};
use orderdesk_core::domain::record::Record;
use orderdesk_core::domain::timestamp::format_timestamp;

use crate::simulator::SimulatorSettings;

const CATALOG: &[(i64, &str)] = &[
    (1, "Chai"),
    (2, "Chang"),
    (3, "Aniseed Syrup"),
    (4, "Chef Anton's Cajun Seasoning"),
    (5, "Chef Anton's Gumbo Mix"),
    (6, "Grandma's Boysenberry Spread"),
    (7, "Uncle Bob's Organic Dried Pears"),
    (8, "Northwoods Cranberry Sauce"),
    (9, "Mishi Kobe Niku"),
    (10, "Ikura"),
    (11, "Queso Cabrales"),
    (14, "Tofu"),
    (41, "Jack's New England Clam Chowder"),
    (42, "Singaporean Hokkien Fried Mee"),
    (51, "Manjimup Dried Apples"),
];

const PREDICTION_CUSTOMERS: &[(i64, &str)] = &[
    (1, "Alfreds Futterkiste"),
    (2, "Ana Trujillo Emparedados y helados"),
    (3, "Antonio Moreno Taquería"),
    (4, "Around the Horn"),
    (5, "Berglunds snabbköp"),
];

/// Records a fallback simulator starts with.
pub trait SeedData: Record {
    fn seed(settings: &SimulatorSettings) -> Vec<Self>;
}

impl SeedData for Customer {
    fn seed(_settings: &SimulatorSettings) -> Vec<Self> {
        seed_customers()
    }
}

impl SeedData for Order {
    fn seed(_settings: &SimulatorSettings) -> Vec<Self> {
        seed_orders()
    }
}

impl SeedData for SalesPrediction {
    fn seed(settings: &SimulatorSettings) -> Vec<Self> {
        let mut rng = match settings.prediction_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        seed_predictions(&mut rng, Utc::now())
    }
}

pub fn catalog() -> Catalog {
    Catalog::new(
        CATALOG
            .iter()
            .map(|(product_id, name)| Product {
                product_id: *product_id,
                product_name: (*name).to_string(),
            })
            .collect(),
    )
}

pub fn seed_customers() -> Vec<Customer> {
    vec![
        Customer {
            cust_id: 1,
            company_name: "Alfreds Futterkiste".to_string(),
            contact_name: Some("Maria Anders".to_string()),
            contact_title: Some("Sales Representative".to_string()),
            address: Some("Obere Str. 57".to_string()),
            city: Some("Berlin".to_string()),
            region: None,
            postal_code: Some("12209".to_string()),
            country: Some("Germany".to_string()),
            phone: Some("030-0074321".to_string()),
            fax: Some("030-0076545".to_string()),
        },
        Customer {
            cust_id: 2,
            company_name: "Ana Trujillo Emparedados y helados".to_string(),
            contact_name: Some("Ana Trujillo".to_string()),
            contact_title: Some("Owner".to_string()),
            address: Some("Avda. de la Constitución 2222".to_string()),
            city: Some("México D.F.".to_string()),
            region: None,
            postal_code: Some("05021".to_string()),
            country: Some("Mexico".to_string()),
            phone: Some("(5) 555-4729".to_string()),
            fax: Some("(5) 555-3745".to_string()),
        },
        Customer {
            cust_id: 3,
            company_name: "Antonio Moreno Taquería".to_string(),
            contact_name: Some("Antonio Moreno".to_string()),
            contact_title: Some("Owner".to_string()),
            address: Some("Mataderos 2312".to_string()),
            city: Some("México D.F.".to_string()),
            region: None,
            postal_code: Some("05023".to_string()),
            country: Some("Mexico".to_string()),
            phone: Some("(5) 555-3932".to_string()),
            fax: None,
        },
    ]
}

struct ShipTo {
    name: &'static str,
    address: &'static str,
    city: &'static str,
    postal_code: &'static str,
    country: &'static str,
}

const ALFREDS: ShipTo = ShipTo {
    name: "Alfreds Futterkiste",
    address: "Obere Str. 57",
    city: "Berlin",
    postal_code: "12209",
    country: "Germany",
};

const ANA_TRUJILLO: ShipTo = ShipTo {
    name: "Ana Trujillo Emparedados y helados",
    address: "Avda. de la Constitución 2222",
    city: "México D.F.",
    postal_code: "05021",
    country: "Mexico",
};

pub fn seed_orders() -> Vec<Order> {
    let catalog = catalog();
    let line = |detail_id: i64, order_id: i64, product_id: i64, unit_price: Decimal, qty: u32| {
        OrderDetail {
            order_detail_id: Some(detail_id),
            order_id: Some(order_id),
            product_id,
            unit_price,
            quantity: qty,
            discount: Decimal::ZERO,
            product: Some(ProductRef {
                product_id,
                product_name: catalog.name_of(product_id).to_string(),
            }),
        }
    };

    vec![
        order(
            (10248, 1, 5, 3),
            ["2023-07-04T00:00:00", "2023-07-12T00:00:00", "2023-07-16T00:00:00"],
            Decimal::new(3238, 2),
            &ALFREDS,
            vec![
                line(1, 10248, 11, Decimal::from(14), 12),
                line(2, 10248, 42, Decimal::new(98, 1), 10),
            ],
        ),
        order(
            (10249, 1, 6, 1),
            ["2023-07-05T00:00:00", "2023-08-16T00:00:00", "2023-07-10T00:00:00"],
            Decimal::new(1161, 2),
            &ALFREDS,
            vec![
                line(3, 10249, 14, Decimal::new(186, 1), 9),
                line(4, 10249, 51, Decimal::new(424, 1), 40),
            ],
        ),
        order(
            (10250, 2, 4, 2),
            ["2023-07-08T00:00:00", "2023-08-05T00:00:00", "2023-07-12T00:00:00"],
            Decimal::new(6583, 2),
            &ANA_TRUJILLO,
            vec![line(5, 10250, 41, Decimal::new(77, 1), 10)],
        ),
    ]
}

fn order(
    (order_id, cust_id, emp_id, shipper_id): (i64, i64, i64, i64),
    [order_date, required_date, shipped_date]: [&str; 3],
    freight: Decimal,
    ship_to: &ShipTo,
    order_details: Vec<OrderDetail>,
) -> Order {
    Order {
        order_id,
        cust_id,
        emp_id: Some(emp_id),
        order_date: order_date.to_string(),
        required_date: Some(required_date.to_string()),
        shipped_date: Some(shipped_date.to_string()),
        shipper_id: Some(shipper_id),
        freight: Some(freight),
        ship_name: Some(ship_to.name.to_string()),
        ship_address: Some(ship_to.address.to_string()),
        ship_city: Some(ship_to.city.to_string()),
        ship_region: Some(String::new()),
        ship_postal_code: Some(ship_to.postal_code.to_string()),
        ship_country: Some(ship_to.country.to_string()),
        status: Some(OrderStatus::Delivered),
        customer: Some(CustomerRef { cust_id, company_name: ship_to.name.to_string() }),
        order_details,
    }
}

/// Placeholder estimates: last order 10..30 days before `now`, interval 15..45 days.
pub fn seed_predictions(rng: &mut impl Rng, now: DateTime<Utc>) -> Vec<SalesPrediction> {
    PREDICTION_CUSTOMERS
        .iter()
        .map(|(customer_id, customer_name)| {
            let days_ago = rng.gen_range(10..30);
            let interval = rng.gen_range(15..45u32);
            let last_order = now - Duration::days(days_ago);
            let next_order = last_order + Duration::days(i64::from(interval));

            SalesPrediction {
                customer_id: *customer_id,
                customer_name: (*customer_name).to_string(),
                last_order_date: format_timestamp(&last_order),
                next_predicted_order: format_timestamp(&next_order),
                average_days_between_orders: interval,
            }
        })
        .collect()
}
