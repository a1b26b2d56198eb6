//! Currency labels offered by the editor.

use serde::{Deserialize, Serialize};

/// Invoice currency. A display label only; amounts are never converted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Myr,
    Sgd,
    Usd,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Myr, Currency::Usd, Currency::Sgd];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Myr => "MYR",
            Currency::Sgd => "SGD",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Myr => "RM",
            Currency::Sgd | Currency::Usd => "$",
        }
    }

    /// Label used in currency pickers, e.g. `MYR (RM)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.as_str(), self.symbol())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MYR" => Ok(Currency::Myr),
            "SGD" => Ok(Currency::Sgd),
            "USD" => Ok(Currency::Usd),
            _ => Err(format!("Unsupported currency: {}", s)),
        }
    }
}
