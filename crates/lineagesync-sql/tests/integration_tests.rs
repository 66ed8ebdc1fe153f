//! Integration tests for column inference over realistic compiled SQL

use lineagesync_core::TransformationType;
use lineagesync_sql::{classify_transformation, infer, infer_column, Inference, Rule};
use pretty_assertions::assert_eq;

const CUSTOMER_ORDERS: &str = r#"
with orders as (
    select * from "analytics"."raw"."orders"
)

select
    customer_id as cust_id,
    upper(country) as country_code,
    amount * 100 as amount_cents,
    count(order_id) as order_count,
    case when tier = 'gold' then 1 else 0 end as is_gold,
    sum(case when status = 'paid' then amount else 0 end) as paid_total,
    legacy_flag
from orders
group by 1, 2, 3, 5, 7
"#;

fn sources(target: &str) -> Vec<String> {
    infer_column(target, CUSTOMER_ORDERS)
        .map(|inferred| inferred.source_columns)
        .unwrap_or_default()
}

#[test]
fn every_column_of_a_dbt_model() {
    assert_eq!(sources("cust_id"), vec!["customer_id"]);
    assert_eq!(sources("order_count"), vec!["order_id"]);
    assert_eq!(sources("amount_cents"), vec!["amount"]);
    assert_eq!(sources("country_code"), vec!["country"]);
    assert_eq!(sources("is_gold"), vec!["tier"]);
    assert_eq!(sources("paid_total"), vec!["status", "amount"]);
    assert_eq!(sources("legacy_flag"), vec!["legacy_flag"]);
    assert!(sources("email").is_empty());
}

#[test]
fn rule_that_fired_for_each_column() {
    let rule = |target: &str| infer(target, CUSTOMER_ORDERS).rule();

    assert_eq!(rule("cust_id"), Some(Rule::DirectAlias));
    assert_eq!(rule("order_count"), Some(Rule::FunctionCall));
    assert_eq!(rule("amount_cents"), Some(Rule::Arithmetic));
    assert_eq!(rule("is_gold"), Some(Rule::CaseWhen));
    assert_eq!(rule("paid_total"), Some(Rule::SumCase));
    assert_eq!(rule("legacy_flag"), Some(Rule::VerbatimMention));
    assert_eq!(rule("email"), None);
}

#[test]
fn classifier_labels() {
    let label = |target: &str| classify_transformation(target, CUSTOMER_ORDERS);

    assert_eq!(label("cust_id"), TransformationType::Identity);
    assert_eq!(label("order_count"), TransformationType::Aggregation);
    assert_eq!(label("amount_cents"), TransformationType::Arithmetic);
    assert_eq!(label("country_code"), TransformationType::Function);
    assert_eq!(label("is_gold"), TransformationType::Conditional);
    assert_eq!(label("paid_total"), TransformationType::Aggregation);
}

#[test]
fn classifier_is_independent_of_rule() {
    // FunctionCall fires, but the label comes from the aggregate probe
    let sql = "SELECT SUM(amount) AS total_amount FROM orders";
    assert_eq!(infer("total_amount", sql).rule(), Some(Rule::FunctionCall));
    assert_eq!(classify_transformation("total_amount", sql), TransformationType::Aggregation);
}

#[test]
fn single_and_multi_column_shapes() {
    assert!(matches!(infer("cust_id", CUSTOMER_ORDERS), Inference::SingleColumn { .. }));
    assert!(matches!(infer("paid_total", CUSTOMER_ORDERS), Inference::MultiColumn { .. }));
    assert_eq!(infer("paid_total", ""), Inference::NoMatch);
}
