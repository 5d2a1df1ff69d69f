//! Payload shape checks and `CampaignInput` extraction.

use serde_json::Value;

use crate::error::ValidationError;
use crate::{
    CampaignInput, TargetAudience, DEFAULT_AGE_GROUP, DEFAULT_BUDGET, DEFAULT_LOCATION,
    DEFAULT_OBJECTIVE,
};

pub const PAYLOAD_FIELD: &str = "Campaign data";
pub const PRODUCT_NAME_FIELD: &str = "Product name";
pub const BUDGET_FIELD: &str = "Budget";

/// Defaults applied to fields the payload omits.
#[derive(Debug, Clone)]
pub struct InputDefaults {
    pub budget: f64,
    pub location: String,
    pub age_group: String,
}

impl Default for InputDefaults {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            location: DEFAULT_LOCATION.to_string(),
            age_group: DEFAULT_AGE_GROUP.to_string(),
        }
    }
}

pub fn validate(payload: &Value) -> Result<(), ValidationError> {
    let fields = match payload {
        Value::Object(fields) if !fields.is_empty() => fields,
        _ => return Err(ValidationError::MissingField { field: PAYLOAD_FIELD }),
    };

    let has_product = fields
        .get("product_name")
        .and_then(Value::as_str)
        .map(|name| !name.trim().is_empty())
        .unwrap_or(false);
    if !has_product {
        return Err(ValidationError::MissingField {
            field: PRODUCT_NAME_FIELD,
        });
    }

    match fields.get("budget") {
        None | Some(Value::Null) => {}
        Some(raw) => {
            let budget = parse_number(raw).ok_or(ValidationError::InvalidNumber {
                field: BUDGET_FIELD,
            })?;
            if budget < 0.0 {
                return Err(ValidationError::NegativeValue {
                    field: BUDGET_FIELD,
                    value: budget,
                });
            }
        }
    }

    Ok(())
}

pub fn parse_campaign(
    payload: &Value,
    defaults: &InputDefaults,
) -> Result<CampaignInput, ValidationError> {
    validate(payload)?;

    let product_name = payload
        .get("product_name")
        .and_then(Value::as_str)
        .map(|name| name.trim().to_string())
        .unwrap_or_default();

    let budget = payload
        .get("budget")
        .and_then(parse_number)
        .unwrap_or(defaults.budget);

    let location = non_empty_str(payload.get("location"))
        .unwrap_or_else(|| defaults.location.clone());

    let audience = payload.get("target_audience");
    let age_group = non_empty_str(audience.and_then(|value| value.get("age_group")))
        .unwrap_or_else(|| defaults.age_group.clone());
    let interests = string_list(audience.and_then(|value| value.get("interests")));

    let mut objectives = string_list(payload.get("objectives"));
    if objectives.is_empty() {
        objectives.push(DEFAULT_OBJECTIVE.to_string());
    }

    Ok(CampaignInput {
        product_name,
        budget,
        location,
        target_audience: TargetAudience {
            age_group,
            interests,
        },
        objectives,
    })
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(joined)) => joined
            .split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
