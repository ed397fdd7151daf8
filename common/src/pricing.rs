//! Unit price lookup shared by the server and the client stores.

use mongodb::bson::oid::ObjectId;

use crate::{
    entities::{
        price::{PriceRule, PriceTable, ProductPricing},
        product::{MailClass, ProductType},
    },
    error,
    repository::RepositoryObject,
};

/// Unit price for the first rule matching `size_key` and `mail_class`.
///
/// Quantity tiers are exactly 1, 2 to 99, and 100 or more. Returns 0 when no
/// rule matches or the quantity is 0.
pub fn price_for(rules: &[PriceRule], size_key: &str, mail_class: MailClass, quantity: u32) -> f64 {
    let Some(rule) = rules
        .iter()
        .find(|r| r.size_key == size_key && r.mail_class == mail_class)
    else {
        return 0.0;
    };

    match quantity {
        0 => 0.0,
        1 => rule.single,
        2..=99 => rule.two_to_ninety_nine,
        _ => rule.hundred_plus,
    }
}

/// Total for `quantity` pieces, rounded to cents.
pub fn total_for(unit_price: f64, quantity: u32) -> f64 {
    (unit_price * quantity as f64 * 100.0).round() / 100.0
}

fn rule(size_key: &str, mail_class: MailClass, prices: [f64; 3]) -> PriceRule {
    PriceRule {
        size_key: size_key.to_string(),
        mail_class,
        single: prices[0],
        two_to_ninety_nine: prices[1],
        hundred_plus: prices[2],
    }
}

/// Table served until an admin stores one.
pub fn default_products() -> Vec<ProductPricing> {
    use MailClass::{FirstClass, Standard};

    vec![
        ProductPricing {
            product_type: ProductType::Postcard,
            rules: vec![
                rule("46", FirstClass, [1.99, 0.98, 0.88]),
                rule("46", Standard, [1.89, 0.88, 0.78]),
                rule("68", FirstClass, [2.25, 1.24, 1.14]),
                rule("68", Standard, [2.15, 1.14, 1.04]),
                rule("611", FirstClass, [2.45, 1.44, 1.34]),
                rule("611", Standard, [2.35, 1.34, 1.24]),
            ],
        },
        ProductPricing {
            product_type: ProductType::Letter,
            rules: vec![
                rule("85x11", FirstClass, [2.95, 1.69, 1.49]),
                rule("85x11", Standard, [2.75, 1.49, 1.29]),
            ],
        },
        ProductPricing {
            product_type: ProductType::Brochure,
            rules: vec![
                rule("85x11", FirstClass, [3.25, 1.89, 1.69]),
                rule("85x11", Standard, [3.05, 1.69, 1.49]),
            ],
        },
        ProductPricing {
            product_type: ProductType::Bookmark,
            rules: vec![
                rule("275x85", FirstClass, [1.75, 0.89, 0.79]),
                rule("275x85", Standard, [1.65, 0.79, 0.69]),
            ],
        },
    ]
}

/// The stored price table, or the built-in one when none was saved yet.
pub async fn current_table(
    prices: &RepositoryObject<PriceTable<ObjectId>>,
) -> error::Result<(PriceTable<ObjectId>, bool)> {
    let stored = prices.find_all(0, 1).await?.into_iter().next();
    Ok(match stored {
        Some(table) => (table, true),
        None => (
            PriceTable {
                id: ObjectId::new(),
                products: default_products(),
                updated_at: 0,
            },
            false,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::price::PriceTable;

    fn postcards() -> Vec<PriceRule> {
        default_products()
            .into_iter()
            .find(|p| p.product_type == ProductType::Postcard)
            .unwrap()
            .rules
    }

    #[test]
    fn quantity_tiers() {
        let rules = postcards();
        assert_eq!(price_for(&rules, "68", MailClass::Standard, 1), 2.15);
        assert_eq!(price_for(&rules, "68", MailClass::Standard, 2), 1.14);
        assert_eq!(price_for(&rules, "68", MailClass::Standard, 50), 1.14);
        assert_eq!(price_for(&rules, "68", MailClass::Standard, 99), 1.14);
        assert_eq!(price_for(&rules, "68", MailClass::Standard, 100), 1.04);
        assert_eq!(price_for(&rules, "68", MailClass::Standard, 150), 1.04);
    }

    #[test]
    fn unknown_rule_is_free() {
        let rules = postcards();
        assert_eq!(price_for(&rules, "unknown", MailClass::Standard, 1), 0.0);
        assert_eq!(price_for(&[], "68", MailClass::Standard, 1), 0.0);
        assert_eq!(price_for(&rules, "68", MailClass::Standard, 0), 0.0);
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![
            rule("68", MailClass::Standard, [5.0, 4.0, 3.0]),
            rule("68", MailClass::Standard, [9.0, 9.0, 9.0]),
        ];
        assert_eq!(price_for(&rules, "68", MailClass::Standard, 1), 5.0);
    }

    #[test]
    fn table_lookup_and_duplicates() {
        let mut table = PriceTable {
            id: (),
            products: default_products(),
            updated_at: 0,
        };
        assert_eq!(
            table.price_for(ProductType::Postcard, "68", MailClass::Standard, 50),
            1.14
        );
        assert_eq!(
            table.price_for(ProductType::Letter, "68", MailClass::Standard, 50),
            0.0
        );
        assert_eq!(table.duplicate_rule(), None);

        table.products[1]
            .rules
            .push(rule("85x11", MailClass::Standard, [1.0, 1.0, 1.0]));
        assert_eq!(
            table.duplicate_rule(),
            Some((ProductType::Letter, "85x11".to_string(), MailClass::Standard))
        );
    }

    #[test]
    fn totals_round_to_cents() {
        assert_eq!(total_for(1.14, 50), 57.0);
        assert_eq!(total_for(1.04, 3), 3.12);
    }
}
