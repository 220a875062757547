use std::any::Any;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use catalog_core::{DomainResult, Entity, EventId, RequiredField, ValidationError};
use catalog_events::{Event, EventDispatcher};

/// Event kind emitted when a product is created.
pub const PRODUCT_CREATED: &str = "product.created";

/// Aggregate: a catalog product.
///
/// Identified by its `name` (natural key). A `Product` value always satisfies the
/// required-field checks of [`validate`]; there is no way to build a partial one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    name: String,
    sku: i64,
    categories: Vec<String>,
    price: i64, // smallest currency unit (e.g. cents)
}

/// Check the four required fields in a fixed order, stopping at the first failure.
///
/// Order: name → sku → categories → price.
pub fn validate(name: &str, sku: i64, categories: &[String], price: i64) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::required(RequiredField::Name));
    }
    if sku <= 0 {
        return Err(ValidationError::required(RequiredField::Sku));
    }
    if categories.is_empty() || categories.iter().any(|c| c.trim().is_empty()) {
        return Err(ValidationError::required(RequiredField::Categories));
    }
    if price <= 0 {
        return Err(ValidationError::required(RequiredField::Price));
    }
    Ok(())
}

impl Product {
    /// Validate and construct a product together with its creation event.
    ///
    /// When a dispatcher is given, the event is dispatched under
    /// [`PRODUCT_CREATED`] before returning (fire-and-forget). Without one,
    /// construction has no side effects and the caller decides when to dispatch.
    pub fn new(
        name: impl Into<String>,
        sku: i64,
        categories: Vec<String>,
        price: i64,
        dispatcher: Option<&EventDispatcher>,
    ) -> DomainResult<(Product, ProductCreated)> {
        let product = Self::restore(name, sku, categories, price)?;
        let event = ProductCreated::from_product(&product, Utc::now());

        if let Some(dispatcher) = dispatcher {
            dispatcher.dispatch(PRODUCT_CREATED, Arc::new(event.clone()));
        }

        Ok((product, event))
    }

    /// Rebuild a product from stored state.
    ///
    /// Runs the same validation as [`Product::new`] but emits no event.
    pub fn restore(
        name: impl Into<String>,
        sku: i64,
        categories: Vec<String>,
        price: i64,
    ) -> DomainResult<Product> {
        let name = name.into();
        validate(&name, sku, &categories, price)?;
        Ok(Product {
            name,
            sku,
            categories,
            price,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> i64 {
        self.sku
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn price(&self) -> i64 {
        self.price
    }
}

impl Entity for Product {
    type Id = str;

    fn id(&self) -> &str {
        &self.name
    }
}

/// Event: ProductCreated.
///
/// Snapshot of the product fields at creation time. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCreated {
    pub event_id: EventId,
    pub name: String,
    pub sku: i64,
    pub categories: Vec<String>,
    pub price: i64,
    pub occurred_at: DateTime<Utc>,
}

impl ProductCreated {
    fn from_product(product: &Product, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_id: EventId::new(),
            name: product.name.clone(),
            sku: product.sku,
            categories: product.categories.clone(),
            price: product.price,
            occurred_at,
        }
    }
}

impl Event for ProductCreated {
    fn event_kind(&self) -> &'static str {
        PRODUCT_CREATED
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn cats(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn new_product_returns_product_and_matching_event() {
        let (product, event) =
            Product::new("Notebook", 12345, cats(&["Electronics", "Computers"]), 3500, None).unwrap();

        assert_eq!(product.name(), "Notebook");
        assert_eq!(product.sku(), 12345);
        assert_eq!(product.categories(), &["Electronics", "Computers"]);
        assert_eq!(product.price(), 3500);
        assert_eq!(product.id(), "Notebook");

        assert_eq!(event.event_kind(), "product.created");
        assert_eq!(event.name, "Notebook");
        assert_eq!(event.sku, 12345);
        assert_eq!(event.categories, cats(&["Electronics", "Computers"]));
        assert_eq!(event.price, 3500);
    }

    #[test]
    fn new_product_rejects_empty_name() {
        let err = Product::new("", 1, cats(&["A"]), 1, None).unwrap_err();
        assert_eq!(err.field(), RequiredField::Name);
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn new_product_rejects_blank_name() {
        let err = Product::new("   ", 1, cats(&["A"]), 1, None).unwrap_err();
        assert_eq!(err.field(), RequiredField::Name);
    }

    #[test]
    fn new_product_rejects_zero_and_negative_sku() {
        for sku in [0, -1] {
            let err = Product::new("Notebook", sku, cats(&["A"]), 1, None).unwrap_err();
            assert_eq!(err.code(), "sku_required");
        }
    }

    #[test]
    fn new_product_rejects_missing_categories() {
        let err = Product::new("Notebook", 1, vec![], 1, None).unwrap_err();
        assert_eq!(err.field(), RequiredField::Categories);

        let err = Product::new("Notebook", 1, cats(&["A", ""]), 1, None).unwrap_err();
        assert_eq!(err.field(), RequiredField::Categories);
    }

    #[test]
    fn new_product_rejects_zero_and_negative_price() {
        for price in [0, -100] {
            let err = Product::new("Notebook", 1, cats(&["A"]), price, None).unwrap_err();
            assert_eq!(err.code(), "price_required");
        }
    }

    #[test]
    fn validation_stops_at_first_failing_field() {
        // Everything is wrong; name is checked first.
        let err = validate("", 0, &[], 0).unwrap_err();
        assert_eq!(err.field(), RequiredField::Name);

        let err = validate("ok", 0, &[], 0).unwrap_err();
        assert_eq!(err.field(), RequiredField::Sku);

        let err = validate("ok", 1, &[], 0).unwrap_err();
        assert_eq!(err.field(), RequiredField::Categories);
    }

    #[test]
    fn duplicate_categories_are_kept() {
        let (product, _) = Product::new("Mouse", 7, cats(&["Gaming", "Gaming"]), 299, None).unwrap();
        assert_eq!(product.categories(), &["Gaming", "Gaming"]);
    }

    #[test]
    fn new_product_dispatches_created_event_when_dispatcher_given() {
        let dispatcher = EventDispatcher::new();
        let (tx, rx) = mpsc::channel::<ProductCreated>();
        dispatcher.register(PRODUCT_CREATED, move |event| {
            let created = event
                .downcast_ref::<ProductCreated>()
                .ok_or_else(|| anyhow::anyhow!("unexpected event type"))?;
            tx.send(created.clone())?;
            Ok(())
        });

        let (_, event) = Product::new("Keyboard", 10, cats(&["Peripherals"]), 150, Some(&dispatcher)).unwrap();

        let received = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(received, event);
    }

    #[test]
    fn invalid_product_dispatches_nothing() {
        let dispatcher = EventDispatcher::new();
        let (tx, rx) = mpsc::channel::<()>();
        dispatcher.register(PRODUCT_CREATED, move |_| {
            tx.send(())?;
            Ok(())
        });

        assert!(Product::new("Keyboard", 10, vec![], 150, Some(&dispatcher)).is_err());
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn restore_validates_without_event() {
        let product = Product::restore("Desk", 3, cats(&["Office"]), 900).unwrap();
        assert_eq!(product.name(), "Desk");
        assert!(Product::restore("Desk", 3, vec![], 900).is_err());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn valid_categories() -> impl Strategy<Value = Vec<String>> {
            prop::collection::vec("[A-Za-z][A-Za-z0-9 ]{0,19}", 1..5)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: valid input always yields a product and event mirroring the input.
            #[test]
            fn valid_input_round_trips_into_product_and_event(
                name in "[A-Za-z][A-Za-z0-9 ]{0,49}",
                sku in 1i64..=i64::MAX,
                categories in valid_categories(),
                price in 1i64..=i64::MAX,
            ) {
                let (product, event) = Product::new(name.clone(), sku, categories.clone(), price, None).unwrap();

                prop_assert_eq!(product.name(), name.as_str());
                prop_assert_eq!(product.sku(), sku);
                prop_assert_eq!(product.categories(), categories.as_slice());
                prop_assert_eq!(product.price(), price);

                prop_assert_eq!(event.event_kind(), PRODUCT_CREATED);
                prop_assert_eq!(&event.name, &name);
                prop_assert_eq!(event.sku, sku);
                prop_assert_eq!(&event.categories, &categories);
                prop_assert_eq!(event.price, price);
            }

            /// Property: breaking exactly one field reports exactly that field.
            #[test]
            fn single_invalid_field_is_reported(
                name in "[A-Za-z][A-Za-z0-9]{0,19}",
                sku in 1i64..10_000,
                categories in valid_categories(),
                price in 1i64..10_000,
                bad in i64::MIN..=0,
                which in 0usize..4,
            ) {
                let result = match which {
                    0 => Product::new("", sku, categories, price, None),
                    1 => Product::new(name, bad, categories, price, None),
                    2 => Product::new(name, sku, Vec::new(), price, None),
                    _ => Product::new(name, sku, categories, bad, None),
                };
                let expected = [
                    RequiredField::Name,
                    RequiredField::Sku,
                    RequiredField::Categories,
                    RequiredField::Price,
                ][which];

                let err = result.unwrap_err();
                prop_assert_eq!(err.field(), expected);
            }
        }
    }
}
