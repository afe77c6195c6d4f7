use bloom_core::domain::preferences::PreferenceProfile;
use bloom_core::domain::product::Marker;
use bloom_core::domain::user::UserId;
use bloom_core::errors::{ApplicationError, DomainError};
use clap::Args;
use tracing::info;

use crate::commands::{store_error, to_data, with_stores, CommandResult, Failure};

/// Onboarding quiz answers. Retaking the quiz replaces every earlier answer.
#[derive(Debug, Clone, Default, Args)]
pub struct QuizArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long = "type", help = "Product type of interest (repeatable)")]
    pub product_types: Vec<String>,
    #[arg(long = "brand", help = "Favourite brand (repeatable)")]
    pub brands: Vec<String>,
    #[arg(
        long = "marker",
        help = "sustainablePackaging, organicIngredients, recyclable or crueltyFree (repeatable)"
    )]
    pub markers: Vec<String>,
    #[arg(long = "skin-concern", help = "Skin concern such as acne or dry (repeatable)")]
    pub skin_concerns: Vec<String>,
    #[arg(long)]
    pub skin_type: Option<String>,
    #[arg(long)]
    pub hair_type: Option<String>,
    #[arg(long = "hair-concern")]
    pub hair_concerns: Vec<String>,
    #[arg(long = "scent")]
    pub scents: Vec<String>,
    #[arg(long)]
    pub frequency: Option<String>,
    #[arg(long)]
    pub price_range: Option<String>,
}

impl QuizArgs {
    pub fn profile(&self) -> Result<PreferenceProfile, DomainError> {
        let sustainability_priorities = self
            .markers
            .iter()
            .filter(|marker| !marker.trim().is_empty())
            .map(|marker| marker.parse::<Marker>())
            .collect::<Result<_, _>>()?;

        Ok(PreferenceProfile {
            product_types: self.product_types.iter().cloned().collect(),
            brands: self.brands.iter().cloned().collect(),
            sustainability_priorities,
            skin_concerns: self.skin_concerns.iter().cloned().collect(),
            skin_type: self.skin_type.clone(),
            hair_type: self.hair_type.clone(),
            hair_concerns: self.hair_concerns.iter().cloned().collect(),
            preferred_scents: self.scents.iter().cloned().collect(),
            product_frequency: self.frequency.clone(),
            price_range: self.price_range.clone(),
        }
        .normalized())
    }
}

pub fn run(args: QuizArgs) -> CommandResult {
    with_stores("quiz", |_config, stores| async move {
        if args.user.trim().is_empty() {
            return Err(Failure::new("bad_request", "--user must not be blank", 6));
        }
        let profile = args.profile().map_err(|error| {
            Failure::from_application("quiz", ApplicationError::Domain(error))
        })?;
        let user = UserId(args.user.trim().to_string());

        stores.preferences.set(&user, profile.clone()).await.map_err(store_error("quiz"))?;
        info!(
            event_name = "preferences.saved",
            user = %user,
            empty = profile.is_empty(),
            "quiz answers stored"
        );

        Ok(CommandResult::success_with_data(
            "quiz",
            format!("saved quiz answers for `{user}`"),
            to_data(&profile)?,
        ))
    })
}

#[cfg(test)]
mod tests {
    use bloom_core::domain::product::Marker;

    use super::QuizArgs;

    #[test]
    fn answers_are_normalized_into_a_profile() {
        let args = QuizArgs {
            user: "u1".into(),
            product_types: vec![" serum ".into(), "".into()],
            markers: vec!["crueltyfree".into(), "Recyclable".into()],
            skin_type: Some("  ".into()),
            ..QuizArgs::default()
        };

        let profile = args.profile().expect("valid answers");

        assert_eq!(profile.product_types.iter().collect::<Vec<_>>(), vec!["serum"]);
        assert!(profile.sustainability_priorities.contains(&Marker::CrueltyFree));
        assert!(profile.sustainability_priorities.contains(&Marker::Recyclable));
        assert_eq!(profile.skin_type, None);
    }

    #[test]
    fn unknown_marker_is_rejected() {
        let args = QuizArgs {
            user: "u1".into(),
            markers: vec!["vegan".into()],
            ..QuizArgs::default()
        };

        assert!(args.profile().is_err());
    }
}
