use std::fmt;

/// Whether a type moves money out of or into the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Classification {
    #[default]
    Outflow,
    Inflow,
}

impl Classification {
    pub fn from_is_outflow(is_outflow: bool) -> Self {
        if is_outflow {
            Classification::Outflow
        } else {
            Classification::Inflow
        }
    }

    pub fn is_outflow(self) -> bool {
        matches!(self, Classification::Outflow)
    }

    pub fn sign(self, magnitude: super::Money) -> super::Money {
        match self {
            Classification::Outflow => -magnitude.abs(),
            Classification::Inflow => magnitude.abs(),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Outflow => write!(f, "expense"),
            Classification::Inflow => write!(f, "income"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRecord {
    pub name: String,
    pub classification: Classification,
}

impl TypeRecord {
    pub fn new(name: impl Into<String>, classification: Classification) -> Self {
        Self {
            name: name.into(),
            classification,
        }
    }
}
