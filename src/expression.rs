//! Filter expressions over non-key attributes.
//!
//! Plain `get`/`put` only address records by `id`. Filtering on any other attribute goes
//! through a [`Filter`], which is rendered into a DynamoDB filter expression with generated
//! name and value placeholders.

use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::to_attribute_value;
use std::{collections, ops};

/// Logical operator for combining conditions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LogicalOperator {
    /// Every condition must hold.
    And,
    /// At least one condition must hold.
    Or,
}

impl ops::Deref for LogicalOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// A test applied to a single attribute.
///
/// ```rust
/// use dynamodb_harness::expression;
///
/// let eq = expression::Condition::Equals("sred@noserver.com".to_string());
/// let missing: expression::Condition<String> = expression::Condition::NotExists;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition<T> {
    /// The attribute is a string starting with the prefix.
    BeginsWith(String),
    /// The attribute (string, set or list) contains the value.
    Contains(T),
    /// The attribute equals the value.
    Equals(T),
    /// The attribute is present.
    Exists,
    /// The attribute differs from the value.
    NotEqual(T),
    /// The attribute is absent.
    NotExists,
}

/// A condition on an attribute path such as `email` or `attributes.street`.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeCondition<T> {
    /// Dot-separated attribute path.
    pub path: String,
    /// The condition to apply.
    pub condition: Condition<T>,
}

/// Conditions combined with one logical operator.
///
/// ```rust
/// use dynamodb_harness::expression::Filter;
///
/// let filter = Filter::equals("email", "sred@noserver.com".to_string());
/// assert_eq!(filter.conditions.len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Filter<T = String> {
    /// How the conditions are combined.
    pub operator: LogicalOperator,
    /// The conditions, rendered in order.
    pub conditions: Vec<AttributeCondition<T>>,
}

impl<T> Filter<T> {
    /// Every condition must hold.
    pub fn all(conditions: Vec<AttributeCondition<T>>) -> Self {
        Self {
            operator: LogicalOperator::And,
            conditions,
        }
    }

    /// At least one condition must hold.
    pub fn any(conditions: Vec<AttributeCondition<T>>) -> Self {
        Self {
            operator: LogicalOperator::Or,
            conditions,
        }
    }

    /// A single equality test.
    pub fn equals(path: impl Into<String>, value: T) -> Self {
        Self::all(vec![AttributeCondition {
            path: path.into(),
            condition: Condition::Equals(value),
        }])
    }
}

/// A rendered expression with its placeholder tables.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExpressionInput {
    pub(crate) expression: String,
    pub(crate) expression_attribute_names: collections::HashMap<String, String>,
    pub(crate) expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl ExpressionInput {
    pub(crate) fn is_empty(&self) -> bool {
        self.expression.is_empty()
    }
}

fn placeholder_identifier(segment: &str) -> String {
    segment
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character
            } else {
                '_'
            }
        })
        .collect()
}

/// Name placeholders of one expression; distinct segments never share a placeholder.
#[derive(Default)]
struct NamePlaceholders {
    by_segment: collections::HashMap<String, String>,
    names: collections::HashMap<String, String>,
}

impl NamePlaceholders {
    fn placeholder(&mut self, segment: &str) -> String {
        if let Some(placeholder) = self.by_segment.get(segment) {
            return placeholder.clone();
        }
        let base = format!("#{}", placeholder_identifier(segment));
        let mut placeholder = base.clone();
        let mut suffix = 0;
        while self.names.contains_key(&placeholder) {
            suffix += 1;
            placeholder = format!("{base}_{suffix}");
        }
        self.names.insert(placeholder.clone(), segment.to_string());
        self.by_segment.insert(segment.to_string(), placeholder.clone());
        placeholder
    }
}

impl<T: Serialize> AttributeCondition<T> {
    fn render(
        self,
        names: &mut NamePlaceholders,
        values: &mut collections::HashMap<String, types::AttributeValue>,
    ) -> serde_dynamo::Result<String> {
        let path = self
            .path
            .split('.')
            .map(|segment| names.placeholder(segment))
            .collect::<Vec<_>>()
            .join(".");
        let leaf = placeholder_identifier(self.path.rsplit('.').next().unwrap_or_default());
        let mut value_placeholder = |suffix: &str, value: types::AttributeValue| {
            let placeholder = format!(":{leaf}_{suffix}{}", values.len());
            values.insert(placeholder.clone(), value);
            placeholder
        };
        let expression = match self.condition {
            Condition::BeginsWith(prefix) => {
                let value = value_placeholder("begins_with", types::AttributeValue::S(prefix));
                format!("begins_with({path}, {value})")
            }
            Condition::Contains(value) => {
                let value = value_placeholder("contains", to_attribute_value(value)?);
                format!("contains({path}, {value})")
            }
            Condition::Equals(value) => {
                let value = value_placeholder("eq", to_attribute_value(value)?);
                format!("{path} = {value}")
            }
            Condition::Exists => format!("attribute_exists({path})"),
            Condition::NotEqual(value) => {
                let value = value_placeholder("ne", to_attribute_value(value)?);
                format!("{path} <> {value}")
            }
            Condition::NotExists => format!("attribute_not_exists({path})"),
        };
        Ok(expression)
    }
}

impl<T: Serialize> TryFrom<Filter<T>> for ExpressionInput {
    type Error = serde_dynamo::Error;

    fn try_from(filter: Filter<T>) -> serde_dynamo::Result<Self> {
        let mut names = NamePlaceholders::default();
        let mut values = collections::HashMap::new();
        let expressions = filter
            .conditions
            .into_iter()
            .map(|condition| condition.render(&mut names, &mut values))
            .collect::<serde_dynamo::Result<Vec<_>>>()?;
        let expression = match expressions.len() {
            0 | 1 => expressions.concat(),
            _ => format!("({})", expressions.join(&*filter.operator)),
        };
        Ok(Self {
            expression,
            expression_attribute_names: names.names,
            expression_attribute_values: values,
        })
    }
}
