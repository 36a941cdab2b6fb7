//! Fixed illustrative document flow used when no source is given or the
//! initial load fails, plus offline relations that make it expandable.

use super::{transform, Graph, Relation, Role};

pub const LEAD_ID: &str = "00000000-0000-0000-0000-000000000001";
pub const OPPORTUNITY_ID: &str = "00000000-0000-0000-0000-000000000002";
pub const QUOTE_ID: &str = "00000000-0000-0000-0000-000000000003";
pub const APPOINTMENT_ID: &str = "00000000-0000-0000-0000-000000000004";
pub const SALES_ORDER_ID: &str = "00000000-0000-0000-0000-000000000005";
pub const DELIVERY_ID: &str = "00000000-0000-0000-0000-000000000006";

const LEAD: (&str, &str, &str) = (LEAD_ID, "64", "878");
const OPPORTUNITY: (&str, &str, &str) = (OPPORTUNITY_ID, "72", "527");
const QUOTE: (&str, &str, &str) = (QUOTE_ID, "30", "261");
const APPOINTMENT: (&str, &str, &str) = (APPOINTMENT_ID, "12", "296");
const SALES_ORDER: (&str, &str, &str) = (SALES_ORDER_ID, "80", "1042");
const DELIVERY: (&str, &str, &str) = (DELIVERY_ID, "90", "733");

/// Lead 878 -> Opportunity 527 -> {Quote 261, Appointment 296}. No node is current.
pub fn demo_graph() -> Graph {
    let relations = [
        Relation::new(LEAD, Role::Successor, OPPORTUNITY),
        Relation::new(OPPORTUNITY, Role::Successor, QUOTE),
        Relation::new(OPPORTUNITY, Role::Successor, APPOINTMENT),
    ];
    transform(&relations, "")
}

/// Relations an offline fetcher answers for each demo object, keyed by object id.
pub fn demo_relations() -> Vec<(&'static str, Vec<Relation>)> {
    vec![
        (
            LEAD_ID,
            vec![Relation::new(LEAD, Role::Successor, OPPORTUNITY)],
        ),
        (
            OPPORTUNITY_ID,
            vec![
                Relation::new(OPPORTUNITY, Role::Predecessor, LEAD),
                Relation::new(OPPORTUNITY, Role::Successor, QUOTE),
                Relation::new(OPPORTUNITY, Role::Successor, APPOINTMENT),
            ],
        ),
        (
            QUOTE_ID,
            vec![
                Relation::new(QUOTE, Role::Predecessor, OPPORTUNITY),
                Relation::new(QUOTE, Role::Successor, SALES_ORDER),
            ],
        ),
        (
            APPOINTMENT_ID,
            vec![Relation::new(APPOINTMENT, Role::Predecessor, OPPORTUNITY)],
        ),
        (
            SALES_ORDER_ID,
            vec![
                Relation::new(SALES_ORDER, Role::Predecessor, QUOTE),
                Relation::new(SALES_ORDER, Role::Successor, DELIVERY),
            ],
        ),
        (
            DELIVERY_ID,
            vec![Relation::new(DELIVERY, Role::Predecessor, SALES_ORDER)],
        ),
    ]
}
