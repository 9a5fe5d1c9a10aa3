//! Parsing and saving inbound HAL documents

mod common;

use assert_json_diff::assert_json_eq;
use common::{BASE, SampleApp};
use reinhardt_hal::prelude::*;
use reinhardt_hal::serializers::entity::lookup_value;
use reinhardt_hal::serializers::fields::link::{DOES_NOT_EXIST, INCORRECT_MATCH, NO_MATCH};
use reinhardt_hal::serializers::{ErrorDetail, InternalValue};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::sync::Arc;

#[fixture]
fn app() -> SampleApp {
	SampleApp::new()
}

fn errors_json(err: &HalError) -> Value {
	serde_json::to_value(err.as_validation().expect("validation error")).unwrap()
}

fn poll_with_choices(app: &SampleApp) -> HalModelSerializer {
	let choices = app.build(HalSerializerConfig::new("Choice").exclude(["poll"]));
	app.build(
		HalSerializerConfig::new("Poll")
			.declare("choices", DeclaredField::embedded(choices).many(true)),
	)
}

#[rstest]
fn test_all_invalid_fields_are_reported(app: SampleApp) {
	app.poll("Lunch?");
	let serializer = app.build(HalSerializerConfig::new("Choice"));

	let err = serializer
		.to_internal_value(
			&json!({
				"choice_text": "x".repeat(201),
				"votes": "many",
				"poll": format!("{BASE}/poll/1")
			}),
			&app.context("/choices"),
		)
		.unwrap_err();

	assert_eq!(err.status_code(), 400);
	assert_json_eq!(
		errors_json(&err),
		json!({
			"choice_text": ["Ensure this field has no more than 200 characters."],
			"votes": ["A valid integer is required."]
		})
	);
}

#[rstest]
fn test_missing_required_fields(app: SampleApp) {
	let serializer = app.build(HalSerializerConfig::new("Choice"));

	let err = serializer
		.to_internal_value(&json!({"votes": 1}), &app.context("/choices"))
		.unwrap_err();

	assert_json_eq!(
		errors_json(&err),
		json!({
			"poll": ["This field is required."],
			"choice_text": ["This field is required."]
		})
	);
}

#[rstest]
fn test_payload_must_be_an_object(app: SampleApp) {
	let serializer = app.build(HalSerializerConfig::new("Poll"));

	let err = serializer
		.to_internal_value(&json!("Lunch?"), &app.context("/polls"))
		.unwrap_err();

	assert_json_eq!(
		errors_json(&err),
		json!({"non_field_errors": ["Invalid data. Expected a dictionary, but got str."]})
	);
}

#[rstest]
#[case(json!("http://testserver/nowhere"), NO_MATCH)]
#[case(json!("http://testserver/choice/1"), INCORRECT_MATCH)]
#[case(json!("http://testserver/poll/99"), DOES_NOT_EXIST)]
#[case(json!(5), "Incorrect type. Expected URL string, received int.")]
#[case(json!({"href": null}), "Incorrect type. Expected URL string, received NoneType.")]
fn test_invalid_hyperlinks(app: SampleApp, #[case] poll: Value, #[case] message: &str) {
	let existing = app.poll("Lunch?");
	app.choice(&existing, "Sushi");
	let serializer = app.build(HalSerializerConfig::new("Choice"));

	let err = serializer
		.to_internal_value(
			&json!({"choice_text": "Ramen", "poll": poll}),
			&app.context("/choices"),
		)
		.unwrap_err();

	assert_eq!(
		err.as_validation().unwrap().get("poll"),
		Some(&ErrorDetail::message(message))
	);
}

#[rstest]
fn test_hyperlink_accepted_under_links(app: SampleApp) {
	let poll = app.poll("Lunch?");
	let serializer = app.build(HalSerializerConfig::new("Choice"));

	let attributes = serializer
		.to_internal_value(
			&json!({
				"_links": {"poll": {"href": format!("{BASE}/poll/1")}},
				"choice_text": "Ramen"
			}),
			&app.context("/choices"),
		)
		.unwrap();

	match &attributes["poll"] {
		InternalValue::Entity(Some(found)) => {
			assert_eq!(lookup_value(found.as_ref(), "pk"), lookup_value(poll.as_ref(), "pk"));
		}
		other => panic!("unexpected value: {other:?}"),
	}
}

#[rstest]
fn test_read_only_fields_are_ignored(app: SampleApp) {
	let serializer = app.build(HalSerializerConfig::new("Poll"));

	let attributes = serializer
		.to_internal_value(
			&json!({"id": 99, "question": "Lunch?", "pub_date": "2014-03-01T00:00:00Z", "extra": true}),
			&app.context("/polls"),
		)
		.unwrap();

	let keys: Vec<_> = attributes.keys().cloned().collect();
	assert_eq!(keys, vec!["question", "pub_date"]);
}

#[rstest]
fn test_create_poll_with_choices(app: SampleApp) {
	let serializer = poll_with_choices(&app);
	let context = app.context("/poll_with_choices");

	let poll = serializer
		.save(
			&json!({
				"question": "What is your favorite animal?",
				"pub_date": "2014-03-01T00:00:00Z",
				"choices": [{"choice_text": "cat"}, {"choice_text": "dog"}]
			}),
			None,
			&context,
		)
		.unwrap();

	let choices = app.store.all("Choice");
	assert_eq!(choices.len(), 2);
	let texts: Vec<_> = choices
		.iter()
		.map(|choice| lookup_value(choice.as_ref(), "choice_text"))
		.collect();
	assert_eq!(texts, vec![Some("cat".to_string()), Some("dog".to_string())]);
	for choice in &choices {
		assert_eq!(lookup_value(choice.as_ref(), "poll__pk"), lookup_value(poll.as_ref(), "pk"));
	}

	let document = serializer.to_representation(poll.as_ref(), &context).unwrap();
	assert_eq!(document["_links"]["self"]["href"], json!(format!("{BASE}/poll/1")));
	assert_eq!(document["pub_date"], json!("2014-03-01T00:00:00Z"));
	assert_eq!(document["_embedded"]["choices"][1]["choice_text"], json!("dog"));
	assert_eq!(document["_embedded"]["choices"][1]["votes"], json!(0));
}

#[rstest]
fn test_create_poll_without_choices(app: SampleApp) {
	let serializer = poll_with_choices(&app);

	let err = serializer
		.save(
			&json!({"question": "What is your favorite animal?", "pub_date": "2014-03-01T00:00:00Z"}),
			None,
			&app.context("/poll_with_choices"),
		)
		.unwrap_err();

	assert_json_eq!(errors_json(&err), json!({"choices": ["This field is required."]}));
	assert!(app.store.all("Poll").is_empty());
}

#[rstest]
fn test_embedded_errors_are_nested_per_item(app: SampleApp) {
	let serializer = poll_with_choices(&app);

	let err = serializer
		.to_internal_value(
			&json!({
				"question": "",
				"pub_date": "2014-03-01T00:00:00Z",
				"_embedded": {"choices": [{"choice_text": "cat"}, {"choice_text": " ", "votes": "x"}]}
			}),
			&app.context("/poll_with_choices"),
		)
		.unwrap_err();

	assert_json_eq!(
		errors_json(&err),
		json!({
			"question": ["This field may not be blank."],
			"choices": [
				{},
				{
					"choice_text": ["This field may not be blank."],
					"votes": ["A valid integer is required."]
				}
			]
		})
	);
}

#[rstest]
fn test_create_channel_with_partners(app: SampleApp) {
	app.partner("abc");
	let partner_uri = format!("{BASE}/partner/1");
	let serializer = app.build(HalSerializerConfig::new("Channel").lookup_field("pk"));
	let context = app.context("/channels");

	let channel = serializer
		.save(&json!({"partners": [partner_uri], "name": "ABC"}), None, &context)
		.unwrap();
	let document = serializer.to_representation(channel.as_ref(), &context).unwrap();

	assert_eq!(document["_links"]["self"], json!({"href": format!("{BASE}/channel/1")}));
	assert_eq!(document["_links"]["partners"], json!([{"href": partner_uri}]));
	assert_eq!(document["name"], json!("ABC"));
}

#[rstest]
fn test_update_replaces_linked_collection(app: SampleApp) {
	let first = app.partner("abc");
	app.partner("def");
	let serializer = app.build(HalSerializerConfig::new("Channel"));
	let context = app.context("/channel/1");
	let channel = app
		.store
		.insert(Record::new("Channel").with("name", "ABC"))
		.unwrap();
	app.store
		.add_to_collection(
			&(channel.clone() as Arc<dyn Entity>),
			"partners",
			reinhardt_hal::serializers::RelatedInput::Existing(first),
		)
		.unwrap();
	let channel: Arc<dyn Entity> = channel;

	let attributes = serializer
		.to_internal_value_partial(
			&json!({"_links": {"partners": [{"href": format!("{BASE}/partner/2")}]}}),
			&context,
		)
		.unwrap();
	let updated = serializer.update(&channel, attributes, &context).unwrap();
	let document = serializer.to_representation(updated.as_ref(), &context).unwrap();

	assert_eq!(document["_links"]["partners"], json!([{"href": format!("{BASE}/partner/2")}]));
	assert_eq!(document["name"], json!("ABC"));
}

#[rstest]
fn test_save_existing_instance(app: SampleApp) {
	let poll = app.poll("Lunch?");
	let choice: Arc<dyn Entity> = app.choice(&poll, "Sushi");
	let serializer = app.build(HalSerializerConfig::new("Choice"));
	let context = app.context("/choice/1");

	let saved = serializer
		.save(
			&json!({"poll": format!("{BASE}/poll/1"), "choice_text": "Ramen", "votes": 3}),
			Some(&choice),
			&context,
		)
		.unwrap();

	assert_eq!(lookup_value(saved.as_ref(), "choice_text").as_deref(), Some("Ramen"));
	assert_eq!(lookup_value(saved.as_ref(), "votes").as_deref(), Some("3"));
	assert_eq!(app.store.all("Choice").len(), 1);
}

#[rstest]
fn test_identity_is_the_self_href(app: SampleApp) {
	let poll = app.poll("Lunch?");
	let serializer = app.build(HalSerializerConfig::new("Poll"));
	let document = serializer.to_representation(poll.as_ref(), &app.context("/poll/1")).unwrap();

	assert_eq!(
		HalModelSerializer::get_identity(&document),
		Some(format!("{BASE}/poll/1"))
	);
	assert_eq!(HalModelSerializer::get_identity(&json!({"_links": {}})), None);
	assert_eq!(HalModelSerializer::get_identity(&json!({"_links": "self"})), None);
}

#[rstest]
fn test_save_moves_choice_to_another_poll(app: SampleApp) {
	let lunch = app.poll("Lunch?");
	app.poll("Dinner?");
	let choice: Arc<dyn Entity> = app.choice(&lunch, "Sushi");
	let context = app.context("/choice/1");
	let choices = app.build(HalSerializerConfig::new("Choice"));
	let polls = app.build(HalSerializerConfig::new("Poll").fields(["question", "choices"]));

	choices
		.save(
			&json!({"poll": format!("{BASE}/poll/2"), "choice_text": "Sushi"}),
			Some(&choice),
			&context,
		)
		.unwrap();

	let polls_after: Vec<Value> = app
		.store
		.all("Poll")
		.iter()
		.map(|poll| polls.to_representation(poll.as_ref(), &context).unwrap())
		.collect();
	assert_eq!(polls_after[0]["_links"]["choices"], json!([]));
	assert_eq!(
		polls_after[1]["_links"]["choices"],
		json!([{"href": format!("{BASE}/choice/1")}])
	);
}

#[rstest]
#[case("josé")]
#[case("jane doe")]
fn test_rendered_href_parses_back_to_the_same_user(app: SampleApp, #[case] username: &str) {
	let user = app.user(username);
	let context = app.context("/profiles");
	let users = app.build(HalSerializerConfig::new("User").lookup_field("username"));
	let profiles = app.build(
		HalSerializerConfig::new("UserProfile").lookup_field("user__username").declare(
			"user",
			DeclaredField::link()
				.view_name("user-detail")
				.lookup_fields(["username"]),
		),
	);
	let href = users.to_representation(user.as_ref(), &context).unwrap()["_links"]["self"]["href"].clone();

	let attributes = profiles
		.to_internal_value(&json!({"user": href, "bio": "Hi"}), &context)
		.unwrap();

	match &attributes["user"] {
		InternalValue::Entity(Some(found)) => {
			assert_eq!(lookup_value(found.as_ref(), "username").as_deref(), Some(username));
		}
		other => panic!("unexpected value: {other:?}"),
	}
}
