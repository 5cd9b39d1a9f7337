use crafting_gateway::queries::{REGISTRY, crafting_document};
use crafting_gateway::{QueryName, QueryRegistry, RecipeCategory};
use proptest::prelude::*;
use strum::IntoEnumIterator;

#[test]
fn every_builtin_query_renders_the_envelope() {
    let registry = QueryRegistry::builtin();
    for name in QueryName::all() {
        let key = name.registry_key();
        let body = registry.lookup(&key).expect("registered body");
        let document = registry.document(&name).expect("document");
        assert_eq!(document, format!("query {key} {{ crafting {{ {body} }} }}"));
    }
}

#[test]
fn fixed_query_keys() {
    assert_eq!(QueryName::VoxStatus.registry_key(), "QUERY_VOX_STATUS");
    assert_eq!(QueryName::VoxStatus.response_key(), "voxStatus");
    assert_eq!(
        QueryName::PossibleIngredients.registry_key(),
        "QUERY_POSSIBLE_INGREDIENTS"
    );
    assert_eq!(
        QueryName::PossibleIngredients.response_key(),
        "possibleIngredients"
    );
    assert_eq!(QueryName::Templates.registry_key(), "QUERY_TEMPLATES");
    assert_eq!(QueryName::Templates.response_key(), "templates");
}

#[test]
fn each_body_selects_its_response_key() {
    let registry = QueryRegistry::builtin();
    for name in QueryName::all() {
        let body = registry.lookup(&name.registry_key()).unwrap();
        assert!(
            body.starts_with(&format!("{} {{", name.response_key())),
            "{name} body does not select {}",
            name.response_key()
        );
    }
}

#[test]
fn global_registry_is_shared() {
    let first = REGISTRY.clone();
    let second = REGISTRY.clone();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), QueryName::all().len());
}

#[test]
fn document_helper_matches_wire_shape() {
    assert_eq!(
        crafting_document("QUERY_TEMPLATES", "templates { id }"),
        "query QUERY_TEMPLATES { crafting { templates { id } } }"
    );
}

fn any_category() -> impl Strategy<Value = RecipeCategory> {
    let all: Vec<RecipeCategory> = RecipeCategory::iter().collect();
    proptest::sample::select(all)
}

proptest! {
    #[test]
    fn category_keys_round_trip_through_casing(category in any_category(), upper in any::<bool>()) {
        let text = if upper {
            category.as_str().to_ascii_uppercase()
        } else {
            category.as_str().to_string()
        };
        let parsed: RecipeCategory = text.parse().unwrap();
        prop_assert_eq!(parsed, category);
        prop_assert_eq!(
            parsed.registry_key(),
            format!("QUERY_{}_RECIPES", category.as_str().to_uppercase())
        );
        prop_assert_eq!(parsed.response_key(), format!("{}Recipes", category.as_str()));
    }

    #[test]
    fn unknown_words_never_parse(word in "[a-z]{1,12}") {
        let known = RecipeCategory::iter().any(|category| category.as_str() == word);
        prop_assert_eq!(word.parse::<RecipeCategory>().is_ok(), known);
    }
}
