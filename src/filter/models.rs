use crate::models::Value;
use serde::Deserialize;

/// Document fields that listing searches can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Type,
    Location,
    Price,
    Bedrooms,
    Featured,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Type => "type",
            Field::Location => "location",
            Field::Price => "price",
            Field::Bedrooms => "bedrooms",
            Field::Featured => "featured",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields the free-text `q` parameter is matched against.
pub const FREE_TEXT_FIELDS: [Field; 3] =
    [Field::Title, Field::Location, Field::Type];

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Exact equality; case-sensitive for text.
    Equals { field: Field, value: Value },
    /// Inclusive bounds. At least one side is always set.
    Range {
        field: Field,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Case-insensitive substring match.
    Contains { field: Field, needle: String },
    /// Holds when any of the inner clauses holds.
    Or(Vec<Clause>),
}

/// All clauses must hold. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub clauses: Vec<Clause>,
}

/// Query-string parameters of the listing endpoint. `limit` rides along
/// here but is not part of the filter; the controller validates it.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub r#type: Option<String>,
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<i64>,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
}

/// Blank text parameters (`?type=`) count as absent.
fn present(param: &Option<String>) -> Option<&str> {
    param.as_deref().filter(|s| !s.is_empty())
}

impl Filter {
    /// Clauses are emitted in a fixed order: type, location, bedrooms,
    /// featured, price, free-text.
    pub fn build(params: &SearchParams) -> Self {
        let mut clauses = Vec::new();

        if let Some(t) = present(&params.r#type) {
            clauses.push(Clause::Equals {
                field: Field::Type,
                value: Value::Text(t.to_string()),
            });
        }
        if let Some(location) = present(&params.location) {
            clauses.push(Clause::Contains {
                field: Field::Location,
                needle: location.to_string(),
            });
        }
        if let Some(bedrooms) = params.bedrooms {
            clauses.push(Clause::Equals {
                field: Field::Bedrooms,
                value: Value::Int(bedrooms),
            });
        }
        if let Some(featured) = params.featured {
            clauses.push(Clause::Equals {
                field: Field::Featured,
                value: Value::Bool(featured),
            });
        }
        if params.min_price.is_some() || params.max_price.is_some() {
            clauses.push(Clause::Range {
                field: Field::Price,
                min: params.min_price,
                max: params.max_price,
            });
        }
        if let Some(q) = present(&params.q) {
            clauses.push(Clause::Or(
                FREE_TEXT_FIELDS
                    .iter()
                    .map(|field| Clause::Contains {
                        field: *field,
                        needle: q.to_string(),
                    })
                    .collect(),
            ));
        }

        Self { clauses }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}
