//! Polls sample application shared by the integration tests

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use reinhardt_hal::prelude::*;
use std::sync::Arc;

pub const BASE: &str = "http://testserver";

pub fn registry() -> ModelRegistry {
	ModelRegistry::new()
		.with(
			ModelMeta::new("sample_app", "Poll")
				.field(ScalarFieldInfo::auto_pk("id"))
				.field(ScalarFieldInfo::new("question", ScalarKind::Text).max_length(200))
				.field(ScalarFieldInfo::new("pub_date", ScalarKind::DateTime))
				.relation(RelationInfo::reverse("choices", "Choice", true)),
		)
		.with(
			ModelMeta::new("sample_app", "Choice")
				.field(ScalarFieldInfo::auto_pk("id"))
				.relation(RelationInfo::forward("poll", "Poll"))
				.field(ScalarFieldInfo::new("choice_text", ScalarKind::Text).max_length(200))
				.field(ScalarFieldInfo::new("votes", ScalarKind::Integer).default_value(0)),
		)
		.with(
			ModelMeta::new("sample_app", "Partner")
				.field(ScalarFieldInfo::auto_pk("id"))
				.field(ScalarFieldInfo::new("name", ScalarKind::Text).max_length(100)),
		)
		.with(
			ModelMeta::new("sample_app", "Channel")
				.field(ScalarFieldInfo::auto_pk("id"))
				.field(ScalarFieldInfo::new("name", ScalarKind::Text).max_length(100))
				.relation(RelationInfo::many_to_many("partners", "Partner").nullable()),
		)
		.with(
			ModelMeta::new("auth", "User")
				.field(ScalarFieldInfo::auto_pk("id"))
				.field(ScalarFieldInfo::new("username", ScalarKind::Text).max_length(150)),
		)
		.with(
			ModelMeta::new("sample_app", "UserProfile")
				.field(ScalarFieldInfo::auto_pk("id"))
				.relation(RelationInfo::forward("user", "User"))
				.field(ScalarFieldInfo::new("bio", ScalarKind::Text).blank().default_value("")),
		)
}

pub fn routes() -> RouteTable {
	RouteTable::new()
		.route("choice-detail", "/choice/{pk}")
		.route("poll-detail", "/poll/{pk}")
		.route("poll-choice-detail", "/poll/{poll__pk}/choice/{pk}")
		.route("poll-list", "/polls")
		.route("channel-detail", "/channel/{pk}")
		.route("partner-detail", "/partner/{pk}")
		.route("user-detail", "/user/{username}")
		.route("userprofile-detail", "/user/{user__username}/profile")
}

pub struct SampleApp {
	pub registry: Arc<ModelRegistry>,
	pub store: Arc<MemoryStore>,
	pub routes: Arc<RouteTable>,
	pub settings: HalSettings,
}

impl SampleApp {
	pub fn new() -> Self {
		let registry = Arc::new(registry());
		Self {
			store: Arc::new(MemoryStore::new(Arc::clone(&registry))),
			registry,
			routes: Arc::new(routes()),
			settings: HalSettings::default(),
		}
	}

	/// Context of a request to `path` on the test server
	pub fn context(&self, path: &str) -> SerializerContext {
		let request = RequestContext::parse(&format!("{}{}", BASE, path)).unwrap();
		SerializerContext::new(self.routes.clone())
			.with_request(request)
			.with_persistence(self.store.clone())
	}

	pub fn build(&self, config: HalSerializerConfig) -> HalModelSerializer {
		config.build(&self.registry, &self.settings).unwrap()
	}

	pub fn poll(&self, question: &str) -> Arc<Record> {
		self.store
			.insert(
				Record::new("Poll")
					.with("question", question)
					.with("pub_date", Utc.with_ymd_and_hms(2014, 1, 3, 0, 0, 0).unwrap()),
			)
			.unwrap()
	}

	pub fn choice(&self, poll: &Arc<Record>, text: &str) -> Arc<Record> {
		self.store
			.insert(
				Record::new("Choice")
					.with("poll", poll.clone())
					.with("choice_text", text),
			)
			.unwrap()
	}

	pub fn partner(&self, name: &str) -> Arc<Record> {
		self.store.insert(Record::new("Partner").with("name", name)).unwrap()
	}

	pub fn user(&self, username: &str) -> Arc<Record> {
		self.store
			.insert(Record::new("User").with("username", username))
			.unwrap()
	}

	pub fn profile(&self, user: &Arc<Record>, bio: &str) -> Arc<Record> {
		self.store
			.insert(Record::new("UserProfile").with("user", user.clone()).with("bio", bio))
			.unwrap()
	}
}
