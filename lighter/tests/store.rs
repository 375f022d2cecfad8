use chrono::{DateTime, Utc};
use lighter::{memory::InMemoryStore, prelude::*};
use rstest::{fixture, rstest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Gadget {
    id: String,
    on: DateTime<Utc>,
    name: String,
    count: i64,
    value: f64,
}

impl Gadget {
    fn new(name: &str, count: i64) -> Self {
        Self {
            id: generate_id(),
            on: Utc::now(),
            name: name.to_string(),
            count,
            value: count as f64 * 1.5,
        }
    }
}

impl Document for Gadget {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "gadgets"
    }
}

#[fixture]
fn store() -> DocumentStore<InMemoryStore> {
    DocumentStore::new(InMemoryStore::new())
}

#[rstest]
#[tokio::test]
async fn save_then_get_returns_saved_id(store: DocumentStore<InMemoryStore>) {
    let gadget = Gadget::new("lamp", 3);

    store.save("gadgets", &gadget.id, &gadget).await.expect("save");
    let fetched: Gadget = store.get_by_id("gadgets", &gadget.id).await.expect("get");

    assert_eq!(fetched.id, gadget.id);
    assert_eq!(fetched, gadget);
}

#[rstest]
#[tokio::test]
async fn saving_twice_replaces_the_document(store: DocumentStore<InMemoryStore>) {
    let mut gadget = Gadget::new("lamp", 3);
    store.save("gadgets", &gadget.id, &gadget).await.expect("first save");

    gadget.count = 4;
    store.save("gadgets", &gadget.id, &gadget).await.expect("second save");

    let fetched: Gadget = store.get_by_id("gadgets", &gadget.id).await.expect("get");
    assert_eq!(fetched.count, 4);
    assert_eq!(store.backend().len("gadgets").await, 1);
}

#[rstest]
#[case("1234567")]
#[case("")]
#[case("-tid")]
#[case(" tid")]
#[tokio::test]
async fn invalid_ids_never_reach_the_backend(store: DocumentStore<InMemoryStore>, #[case] id: &str) {
    let gadget = Gadget::new("lamp", 1);

    let save = store.save("gadgets", id, &gadget).await.expect_err("save");
    let get = store.get_by_id::<Gadget>("gadgets", id).await.expect_err("get");
    let delete = store.delete_by_id("gadgets", id).await.expect_err("delete");

    assert!(save.is_invalid_argument());
    assert!(get.is_invalid_argument());
    assert!(delete.is_invalid_argument());
    assert_eq!(store.backend().call_count(), 0);
}

#[rstest]
#[tokio::test]
async fn empty_collection_never_reaches_the_backend(store: DocumentStore<InMemoryStore>) {
    let gadget = Gadget::new("lamp", 1);

    let err = store.save("", &gadget.id, &gadget).await.expect_err("save");

    assert!(err.is_invalid_argument());
    assert_eq!(store.backend().call_count(), 0);
}

#[rstest]
#[tokio::test]
async fn deleted_document_is_not_found(store: DocumentStore<InMemoryStore>) {
    let gadget = Gadget::new("lamp", 1);
    store.save("gadgets", &gadget.id, &gadget).await.expect("save");

    store.delete_by_id("gadgets", &gadget.id).await.expect("delete");
    let err = store.get_by_id::<Gadget>("gadgets", &gadget.id).await.expect_err("gone");

    assert!(err.is_not_found());
    assert!(err.to_string().contains(&gadget.id));
}

#[rstest]
#[tokio::test]
async fn deleting_twice_is_not_an_error(store: DocumentStore<InMemoryStore>) {
    let id = generate_id();

    store.delete_by_id("gadgets", &id).await.expect("first delete");
    store.delete_by_id("gadgets", &id).await.expect("second delete");
}

#[rstest]
#[tokio::test]
async fn derived_ids_address_the_same_document(store: DocumentStore<InMemoryStore>) {
    let id = derive_id("user@example.com");
    let gadget = Gadget { id: id.clone(), ..Gadget::new("profile", 1) };

    store.save("gadgets", &derive_id("user@example.com"), &gadget).await.expect("save");
    let fetched: Gadget = store.get_by_id("gadgets", &id).await.expect("get");

    assert_eq!(fetched.name, "profile");
}

#[rstest]
#[tokio::test]
async fn record_layout_round_trips(store: DocumentStore<InMemoryStore>) {
    let record = Record::new(Gadget::new("lamp", 2));

    store.save("records", &record.id, &record).await.expect("save");
    let fetched: Record<Gadget> = store.get_by_id("records", &record.id).await.expect("get");

    assert_eq!(fetched.id, record.id);
    assert_eq!(fetched.data, record.data);
}

#[rstest]
#[tokio::test]
async fn typed_collection_uses_document_ids(store: DocumentStore<InMemoryStore>) {
    let gadgets = store.typed_collection::<Gadget>();
    let first = Gadget::new("lamp", 1);
    let second = Gadget::new("desk", 2);

    gadgets.save_all(&[first.clone(), second.clone()]).await.expect("save all");

    assert_eq!(gadgets.name(), "gadgets");
    assert_eq!(gadgets.get(&second.id).await.expect("get"), second);
    assert_eq!(gadgets.delete_all(1).await.expect("delete all"), 2);
    assert!(gadgets.get(&first.id).await.expect_err("gone").is_not_found());
}

#[rstest]
#[tokio::test]
async fn untyped_collection_routes_through_the_store(store: DocumentStore<InMemoryStore>) {
    let notes = store.collection("notes");
    let id = generate_id();

    notes.save(&id, &Gadget::new("note", 7)).await.expect("save");
    let fetched: Gadget = notes.get(&id).await.expect("get");
    notes.delete(&id).await.expect("delete");

    assert_eq!(fetched.count, 7);
    assert_eq!(store.backend().len("notes").await, 0);
}

#[rstest]
#[tokio::test]
async fn open_builds_the_backend() {
    let store = DocumentStore::open(InMemoryStore::builder()).await.expect("open");

    assert!(store.operation_timeout().is_none());
    store.close().await.expect("close");
}
