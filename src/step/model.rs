use bon::Builder;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Builder)]
pub struct Step {
    pub id: i64,
    pub name: String,
    pub order: i64,
    #[serde(default = "required_by_default")]
    #[builder(default = true)]
    pub required: bool,
}

fn required_by_default() -> bool {
    true
}

/// Canonical catalog order. Ties fall back to the id so the matrix columns are stable.
pub fn sort_steps(steps: &mut [Step]) {
    steps.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
}
