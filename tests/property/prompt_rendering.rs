//! Prompt rendering properties

use challenge_factory::prompt::{PromptBuilder, PromptOutcome, PromptTemplate};
use challenge_factory::types::UserProfile;
use chrono::NaiveDate;
use proptest::prelude::*;

fn builder() -> PromptBuilder {
    PromptBuilder::new(
        PromptTemplate::builtin("es").unwrap(),
        15,
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
    )
}

fn profile_strategy() -> impl Strategy<Value = UserProfile> {
    (
        "[a-z0-9]{1,12}",
        "[A-Za-zÁÉÍÓÚáéíóúñ ]{0,20}",
        prop::collection::vec(("[a-z]{1,10}", "[a-z ]{0,20}"), 0..6),
    )
        .prop_map(|(id, name, attrs)| {
            let mut profile = UserProfile::new(format!("id-{id}"), name);
            for (attr, value) in attrs {
                profile = profile.with_attribute(attr, value);
            }
            profile
        })
}

proptest! {
    #[test]
    fn building_is_deterministic(profile in profile_strategy()) {
        let builder = builder();
        prop_assert_eq!(builder.build(&profile), builder.build(&profile));
    }

    #[test]
    fn identity_decides_between_request_and_skip(profile in profile_strategy()) {
        match builder().build(&profile) {
            PromptOutcome::Request(request) => {
                prop_assert!(profile.has_identity());
                prop_assert_eq!(request.user_id(), profile.user_id.as_str());
                prop_assert!(request.prompt().contains(profile.display_name.trim()));
                for attribute in &profile.attributes {
                    prop_assert!(request.prompt().contains(&attribute.name));
                }
            }
            PromptOutcome::Skip(reason) => {
                prop_assert!(!profile.has_identity());
                prop_assert_eq!(reason, "missing identity");
            }
        }
    }
}
