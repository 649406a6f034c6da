use serde::{Deserialize, Serialize};

use crate::domain::record::{EntityKind, FieldValue, Record};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub cust_id: i64,
    pub company_name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_title: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub fax: Option<String>,
}

impl Record for Customer {
    const KIND: EntityKind = EntityKind::Customers;
    const SEARCH_FIELDS: &'static [&'static str] = &["companyName", "contactName", "country"];

    fn id(&self) -> i64 {
        self.cust_id
    }

    fn set_id(&mut self, id: i64) {
        self.cust_id = id;
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name.to_ascii_lowercase().as_str() {
            "custid" | "customerid" | "id" => FieldValue::number(self.cust_id),
            "companyname" => Some(FieldValue::Text(self.company_name.clone())),
            "contactname" => FieldValue::text(&self.contact_name),
            "contacttitle" => FieldValue::text(&self.contact_title),
            "address" => FieldValue::text(&self.address),
            "city" => FieldValue::text(&self.city),
            "region" => FieldValue::text(&self.region),
            "postalcode" => FieldValue::text(&self.postal_code),
            "country" => FieldValue::text(&self.country),
            "phone" => FieldValue::text(&self.phone),
            "fax" => FieldValue::text(&self.fax),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Customer;
    use crate::domain::record::{FieldValue, Record};

    #[test]
    fn decodes_wire_shape_with_nulls() {
        let customer: Customer = serde_json::from_value(json!({
            "custId": 7,
            "companyName": "Around the Horn",
            "contactName": "Thomas Hardy",
            "region": null,
            "country": "UK"
        }))
        .expect("decode customer");

        assert_eq!(customer.id(), 7);
        assert_eq!(customer.region, None);
        assert_eq!(customer.field("Country"), Some(FieldValue::Text("UK".to_string())));
        assert_eq!(customer.field("unknown"), None);
    }
}
