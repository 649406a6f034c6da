use serde::{Deserialize, Serialize};

pub const UNKNOWN_PRODUCT_NAME: &str = "Product";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: i64,
    pub product_name: String,
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn find(&self, product_id: i64) -> Option<&Product> {
        self.products.iter().find(|product| product.product_id == product_id)
    }

    pub fn name_of(&self, product_id: i64) -> &str {
        self.find(product_id)
            .map(|product| product.product_name.as_str())
            .unwrap_or(UNKNOWN_PRODUCT_NAME)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, Product, UNKNOWN_PRODUCT_NAME};

    #[test]
    fn unknown_products_get_a_generic_name() {
        let catalog =
            Catalog::new(vec![Product { product_id: 14, product_name: "Tofu".to_string() }]);

        assert_eq!(catalog.name_of(14), "Tofu");
        assert_eq!(catalog.name_of(99), UNKNOWN_PRODUCT_NAME);
    }
}
