mod common;

use std::time::Duration;

use common::{image, place_hit, FakeActivities, FakeIndex, FakeModel, Harness, ModelCall, PlanReply, IMAGE_DESCRIPTION};
use dreamtrip_api::models::{
    activity::Activity,
    trip_request::{ModelChoice, TripRequest, TripRequestError},
};
use dreamtrip_api::services::{
    image_description_service::describe_images,
    itinerary_flow::FlowError,
    itinerary_generation_service::GenerationError,
    place_retriever::PlaceRetriever,
};

fn three_places() -> FakeIndex {
    FakeIndex::new(vec![
        place_hit("bali", "Bali", 0.91),
        place_hit("maldives", "Maldives", 0.87),
        place_hit("phuket", "Phuket", 0.64),
    ])
}

#[actix_rt::test]
async fn beach_request_without_images_yields_one_itinerary_per_place() {
    let harness = Harness::new(FakeModel::new("default"), three_places(), FakeActivities::default());

    let itineraries = harness
        .flow
        .submit("relaxing beach vacation", vec![], None)
        .await
        .unwrap();

    let refs: Vec<&str> = itineraries.iter().map(|i| i.place_ref.as_str()).collect();
    assert_eq!(refs, vec!["bali", "maldives", "phuket"]);
    for itinerary in &itineraries {
        assert_eq!(
            itinerary.itinerary_image_url,
            format!("https://img.example/{}.jpg", itinerary.place_ref)
        );
    }
    assert_eq!(itineraries[0].content.place, "Bali");

    // No images: the only model calls are the three generations.
    let calls = harness.default_model.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| matches!(c, ModelCall::Generate { .. })));

    let queries = harness.index.queries();
    assert_eq!(queries, vec![("relaxing beach vacation\n".to_string(), 3)]);
}

#[actix_rt::test]
async fn mountain_trek_with_images_drops_the_empty_generation() {
    let model = FakeModel::new("default").reply("Dolomites", PlanReply::Nothing);
    let index = FakeIndex::new(vec![
        place_hit("patagonia", "Patagonia", 0.8),
        place_hit("dolomites", "Dolomites", 0.7),
    ]);
    let harness = Harness::new(model, index, FakeActivities::default());

    let itineraries = harness
        .flow
        .submit("mountain trek", vec![image(b"one"), image(b"two")], None)
        .await
        .unwrap();

    assert_eq!(itineraries.len(), 1);
    assert_eq!(itineraries[0].place_ref, "patagonia");

    let calls = harness.default_model.calls();
    assert_eq!(calls[0], ModelCall::Describe { image_count: 2 });

    let (query, _) = &harness.index.queries()[0];
    assert_eq!(query, &format!("mountain trek\n{}", IMAGE_DESCRIPTION));
}

#[actix_rt::test]
async fn empty_request_fails_before_any_external_call() {
    let harness = Harness::new(FakeModel::new("default"), three_places(), FakeActivities::default());

    let err = harness.flow.submit("", vec![image(b"x")], None).await.unwrap_err();

    assert!(matches!(err, FlowError::InvalidRequest(TripRequestError::EmptyRequest)));
    assert!(harness.default_model.calls().is_empty());
    assert!(harness.alternate_model.calls().is_empty());
    assert!(harness.index.queries().is_empty());
    assert!(harness.activities.lookups().is_empty());
}

#[actix_rt::test]
async fn alternate_choice_uses_alternate_model_throughout() {
    let harness = Harness::new(FakeModel::new("default"), three_places(), FakeActivities::default());

    let itineraries = harness
        .flow
        .submit("city break", vec![image(b"skyline")], Some("openai"))
        .await
        .unwrap();

    assert_eq!(itineraries.len(), 3);
    assert!(harness.default_model.calls().is_empty());

    let calls = harness.alternate_model.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], ModelCall::Describe { image_count: 1 });
    assert_eq!(
        calls.iter().filter(|c| matches!(c, ModelCall::Generate { .. })).count(),
        3
    );
}

#[actix_rt::test]
async fn failed_image_description_aborts_the_flow() {
    let model = FakeModel::new("default").failing_description();
    let harness = Harness::new(model, three_places(), FakeActivities::default());

    let err = harness
        .flow
        .submit("somewhere like this", vec![image(b"pic")], None)
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::ImageDescription(_)));
    assert!(harness.index.queries().is_empty());
}

#[actix_rt::test]
async fn empty_image_description_retrieves_with_the_request_alone() {
    let model = FakeModel::new("default").empty_description();
    let harness = Harness::new(model, three_places(), FakeActivities::default());

    let itineraries = harness
        .flow
        .submit("somewhere like this", vec![image(b"pic")], None)
        .await
        .unwrap();

    assert_eq!(itineraries.len(), 3);
    assert_eq!(
        harness.index.queries(),
        vec![("somewhere like this\n".to_string(), 3)]
    );
}

#[actix_rt::test]
async fn failed_retrieval_aborts_the_flow() {
    let harness = Harness::new(FakeModel::new("default"), FakeIndex::failing(), FakeActivities::default());

    let err = harness.flow.submit("anywhere warm", vec![], None).await.unwrap_err();

    assert!(matches!(err, FlowError::Retrieval(_)));
    assert!(harness.default_model.calls().is_empty());
}

#[actix_rt::test]
async fn failing_generation_is_dropped_without_affecting_siblings() {
    let model = FakeModel::new("default")
        .reply("Bali", PlanReply::Fail)
        .reply("Phuket", PlanReply::Malformed);
    let activities = FakeActivities::default().failing_for("maldives");
    let harness = Harness::new(model, three_places(), activities);

    let itineraries = harness.flow.submit("beach", vec![], None).await.unwrap();

    assert!(itineraries.is_empty());
    assert_eq!(harness.activities.lookups().len(), 3);
}

#[actix_rt::test]
async fn abort_policy_surfaces_the_first_failed_place() {
    let model = FakeModel::new("default").reply("Maldives", PlanReply::Fail);
    let harness = Harness::abort_on_failure(model, three_places(), FakeActivities::default());

    let err = harness.flow.submit("beach", vec![], None).await.unwrap_err();

    match err {
        FlowError::Generation { place_ref, source } => {
            assert_eq!(place_ref, "maldives");
            assert!(matches!(source, GenerationError::Llm(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[actix_rt::test]
async fn results_follow_retrieval_order_not_completion_order() {
    let model = FakeModel::new("default")
        .delay("Bali", Duration::from_millis(60))
        .delay("Maldives", Duration::from_millis(30));
    let harness = Harness::new(model, three_places(), FakeActivities::default());

    let itineraries = harness.flow.submit("beach", vec![], None).await.unwrap();

    let refs: Vec<&str> = itineraries.iter().map(|i| i.place_ref.as_str()).collect();
    assert_eq!(refs, vec!["bali", "maldives", "phuket"]);
}

#[actix_rt::test]
async fn generations_run_concurrently() {
    let model = FakeModel::new("default")
        .delay("Bali", Duration::from_millis(200))
        .delay("Maldives", Duration::from_millis(200))
        .delay("Phuket", Duration::from_millis(200));
    let harness = Harness::new(model, three_places(), FakeActivities::default());

    let started = std::time::Instant::now();
    let itineraries = harness.flow.submit("beach", vec![], None).await.unwrap();

    assert_eq!(itineraries.len(), 3);
    assert!(started.elapsed() < Duration::from_millis(550));
}

#[actix_rt::test]
async fn retrieval_orders_by_score_and_applies_the_limit() {
    let index = FakeIndex::new(vec![
        place_hit("low", "Low", 0.1),
        place_hit("high", "High", 0.9),
        place_hit("mid", "Mid", 0.5),
        place_hit("top", "Top", 0.95),
    ]);
    let retriever = PlaceRetriever::new(std::sync::Arc::new(index));

    let places = retriever.retrieve_places("anything", 3).await.unwrap();

    let refs: Vec<&str> = places.iter().map(|p| p.reference.as_str()).collect();
    assert_eq!(refs, vec!["top", "high", "mid"]);
    for place in &places {
        assert_eq!(place.known_for, format!("{} is known for its views", place.name));
        assert_eq!(place.continent, "");
        assert!(place.tags.is_empty());
        let value = serde_json::to_value(place).unwrap();
        assert!(value.get("embedding").is_none());
    }
}

#[actix_rt::test]
async fn every_itinerary_refers_to_a_retrieved_place() {
    let model = FakeModel::new("default").reply("Phuket", PlanReply::Nothing);
    let harness = Harness::new(model, three_places(), FakeActivities::default());

    let itineraries = harness.flow.submit("beach", vec![], None).await.unwrap();

    let retrieved = ["bali", "maldives", "phuket"];
    assert!(itineraries.len() <= retrieved.len());
    assert!(itineraries.iter().all(|i| retrieved.contains(&i.place_ref.as_str())));
}

#[actix_rt::test]
async fn describing_no_images_makes_no_model_call() {
    let harness = Harness::new(FakeModel::new("default"), three_places(), FakeActivities::default());
    let handle = harness.flow.selector().handle_for(ModelChoice::Default);

    let description = describe_images(&[], &handle).await.unwrap();

    assert_eq!(description, "");
    assert!(harness.default_model.calls().is_empty());
}

#[actix_rt::test]
async fn activities_reach_the_generation_prompt() {
    let activities = FakeActivities::default().with(
        "bali",
        vec![Activity {
            name: "Surf lesson".to_string(),
            description: "Morning waves at Kuta".to_string(),
            image_url: None,
        }],
    );
    let harness = Harness::new(
        FakeModel::new("default"),
        FakeIndex::new(vec![place_hit("bali", "Bali", 0.9)]),
        activities,
    );

    let trip = TripRequest::new("surf trip", vec![], ModelChoice::Default).unwrap();
    let itineraries = harness.flow.run(&trip).await.unwrap();

    assert_eq!(itineraries.len(), 1);
    assert_eq!(harness.activities.lookups(), vec!["bali".to_string()]);

    match &harness.default_model.calls()[0] {
        ModelCall::Generate { place, prompt } => {
            assert_eq!(place, "Bali");
            assert!(prompt.contains("The customer asked for: surf trip"));
            assert!(prompt.contains("- Surf lesson: Morning waves at Kuta"));
        }
        other => panic!("unexpected call: {other:?}"),
    }
}
