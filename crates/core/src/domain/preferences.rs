use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::product::Marker;

/// Answers from the onboarding quiz. Retaking the quiz replaces the whole
/// profile; fields the user skipped stay empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferenceProfile {
    pub product_types: BTreeSet<String>,
    pub brands: BTreeSet<String>,
    pub sustainability_priorities: BTreeSet<Marker>,
    pub skin_concerns: BTreeSet<String>,
    pub skin_type: Option<String>,
    pub hair_type: Option<String>,
    pub hair_concerns: BTreeSet<String>,
    pub preferred_scents: BTreeSet<String>,
    pub product_frequency: Option<String>,
    pub price_range: Option<String>,
}

impl PreferenceProfile {
    /// Trims every answer and drops the blank ones.
    pub fn normalized(self) -> Self {
        Self {
            product_types: clean_set(self.product_types),
            brands: clean_set(self.brands),
            sustainability_priorities: self.sustainability_priorities,
            skin_concerns: clean_set(self.skin_concerns),
            skin_type: clean_option(self.skin_type),
            hair_type: clean_option(self.hair_type),
            hair_concerns: clean_set(self.hair_concerns),
            preferred_scents: clean_set(self.preferred_scents),
            product_frequency: clean_option(self.product_frequency),
            price_range: clean_option(self.price_range),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn clean_set(values: BTreeSet<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn clean_option(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
