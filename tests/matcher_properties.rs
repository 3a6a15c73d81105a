//! Property tests for model matching
//!
//! Checks the matcher's guarantees over arbitrary model lists:
//! - a non-empty list always yields one of its own models
//! - an exact id always wins over any similarity score
//! - the chosen model has the best score, earliest on ties
//! - similarity is bounded, reflexive and symmetric

use lmtic::matcher::{rank_models, select_model, similarity_ratio};
use lmtic::models::ModelInfo;
use proptest::prelude::*;
use std::collections::HashSet;

fn unique_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9:._-]{1,16}", 1..8).prop_map(|ids| {
        let mut seen = HashSet::new();
        ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
    })
}

fn to_models(ids: &[String]) -> Vec<ModelInfo> {
    ids.iter().map(|id| ModelInfo::new(id.clone(), "user")).collect()
}

proptest! {
    #[test]
    fn selection_is_always_a_listed_model(ids in unique_ids(), requested in "[a-z0-9:._-]{0,16}") {
        let models = to_models(&ids);
        let chosen = select_model(&models, &requested).expect("non-empty list");
        prop_assert!(models.iter().any(|m| m == chosen));
    }

    #[test]
    fn exact_id_always_wins(ids in unique_ids(), pick in any::<prop::sample::Index>()) {
        let models = to_models(&ids);
        let target = &models[pick.index(models.len())];
        let chosen = select_model(&models, &target.id).expect("non-empty list");
        prop_assert_eq!(&chosen.id, &target.id);
    }

    #[test]
    fn fuzzy_choice_has_the_best_score(ids in unique_ids(), requested in "[a-z]{1,8}") {
        let models = to_models(&ids);
        prop_assume!(!ids.contains(&requested));

        let chosen = select_model(&models, &requested).expect("non-empty list");
        let best = rank_models(&models, &requested)[0].1;
        let chosen_score = similarity_ratio(&chosen.id, &requested);
        prop_assert_eq!(chosen_score, best);

        // Earliest among equally scored models
        let first_best = models
            .iter()
            .find(|m| similarity_ratio(&m.id, &requested) == best)
            .expect("some model has the best score");
        prop_assert_eq!(&chosen.id, &first_best.id);
    }

    #[test]
    fn ratio_is_bounded_reflexive_and_symmetric(a in "\\PC{0,12}", b in "\\PC{0,12}") {
        let ab = similarity_ratio(&a, &b);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert_eq!(ab, similarity_ratio(&b, &a));
        prop_assert_eq!(similarity_ratio(&a, &a), 1.0);
    }

    #[test]
    fn selection_is_deterministic(ids in unique_ids(), requested in "[a-z]{0,8}") {
        let models = to_models(&ids);
        let first = select_model(&models, &requested).map(|m| m.id.clone());
        let second = select_model(&models, &requested).map(|m| m.id.clone());
        prop_assert_eq!(first, second);
    }
}
