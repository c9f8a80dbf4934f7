use docmapper::{
    bson::{Document, doc},
    memory::InMemoryDriver,
    prelude::*,
};
use pretty_assertions::assert_eq;

const CONNECTION_URI: &str = "mongodb://localhost/test";
const COLLECTION_NAME: &str = "docs";

fn strip_id(mut document: Document) -> Document {
    document.remove("_id");
    document
}

fn memory_mapper(driver: &InMemoryDriver) -> DataMapper {
    create_data_mapper(
        MapperOptions::builder()
            .driver(driver.clone())
            .connection_uri(CONNECTION_URI)
            .collection_name(COLLECTION_NAME)
            .transform(strip_id)
            .build(),
    )
    .unwrap()
}

async fn seeded_mapper(driver: &InMemoryDriver) -> DataMapper {
    let mut mapper = memory_mapper(driver);
    mapper.initialize().await.unwrap();

    for (title, views) in [("intro", 10), ("setup", 3), ("usage", 7), ("faq", 3)] {
        mapper.create(doc! { "title": title, "views": views }).await.unwrap();
    }

    mapper
}

fn titles(documents: &[Document]) -> Vec<&str> {
    documents
        .iter()
        .map(|document| document.get_str("title").unwrap())
        .collect()
}

#[test]
fn test_missing_options() {
    let err = create_data_mapper(None).unwrap_err();

    assert!(err.is_configuration());
    assert!(err.to_string().contains("`options` is missing"));
}

#[test]
fn test_missing_collection_name() {
    let err = create_data_mapper(
        MapperOptions::from_json(r#"{ "connectionUri": "mongodb://localhost/test" }"#).unwrap(),
    )
    .unwrap_err();

    assert!(err.to_string().contains("`options.collection_name` is missing"));
}

#[cfg(feature = "mongodb")]
#[test]
fn test_default_driver_is_filled_in() {
    let mapper = create_data_mapper(
        MapperOptions::from_json(r#"{ "connectionUri": "mongodb://localhost/test", "collectionName": "docs" }"#)
            .unwrap(),
    )
    .unwrap();

    assert!(!mapper.is_initialized());
    assert_eq!(mapper.collection_name(), COLLECTION_NAME);
}

#[tokio::test]
async fn test_lifecycle() {
    let driver = InMemoryDriver::new();
    let mut mapper = memory_mapper(&driver);

    assert!(!mapper.is_initialized());

    mapper.initialize().await.unwrap();
    assert!(mapper.is_initialized());

    mapper.destroy().await.unwrap();
    assert!(!mapper.is_initialized());

    // A destroyed mapper can be initialized again.
    mapper.initialize().await.unwrap();
    assert!(mapper.is_initialized());
    mapper.destroy().await.unwrap();
}

#[tokio::test]
async fn test_crud_before_initialize() {
    let mapper = memory_mapper(&InMemoryDriver::new());

    let err = mapper.find(QueryOptions::default()).await.unwrap_err();

    assert!(matches!(err, DataMapperError::NotInitialized));
}

#[tokio::test]
async fn test_create_then_find_applies_transform() {
    let driver = InMemoryDriver::new();
    let mut mapper = seeded_mapper(&driver).await;

    let documents = mapper.find(QueryOptions::default()).await.unwrap();

    assert_eq!(titles(&documents), vec!["intro", "setup", "usage", "faq"]);
    assert!(documents.iter().all(|document| !document.contains_key("_id")));

    mapper.destroy().await.unwrap();
}

#[tokio::test]
async fn test_find_with_filter_sort_and_pagination() {
    let driver = InMemoryDriver::new();
    let mut mapper = seeded_mapper(&driver).await;

    let documents = mapper
        .find(
            QueryOptions::builder()
                .query(Filter::lt("views", 10))
                .sort("views", SortDirection::Asc)
                .sort("title", SortDirection::Desc)
                .skip(1)
                .limit(2)
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(titles(&documents), vec!["faq", "usage"]);

    mapper.destroy().await.unwrap();
}

#[tokio::test]
async fn test_find_with_projection() {
    let driver = InMemoryDriver::new();
    let mut mapper = seeded_mapper(&driver).await;

    let documents = mapper
        .find(
            QueryOptions::builder()
                .query(Filter::eq("title", "intro"))
                .project(Projection::exclude(["views"]))
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(documents, vec![doc! { "title": "intro" }]);

    mapper.destroy().await.unwrap();
}

#[tokio::test]
async fn test_find_one_ignores_caller_limit() {
    let driver = InMemoryDriver::new();
    let mut mapper = seeded_mapper(&driver).await;

    let document = mapper
        .find_one(
            QueryOptions::builder()
                .sort("views", SortDirection::Desc)
                .limit(3)
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(document, Some(doc! { "title": "intro", "views": 10 }));

    let missing = mapper
        .find_one(QueryOptions::filter(Filter::eq("title", "missing")))
        .await
        .unwrap();
    assert_eq!(missing, None);

    mapper.destroy().await.unwrap();
}

#[tokio::test]
async fn test_update_returns_post_update_document() {
    let driver = InMemoryDriver::new();
    let mut mapper = seeded_mapper(&driver).await;

    let updated = mapper
        .update(UpdateOptions::new(Filter::eq("title", "setup"), doc! { "views": 4 }))
        .await
        .unwrap();

    assert_eq!(updated, Some(doc! { "title": "setup", "views": 4 }));

    let missing = mapper
        .update(UpdateOptions::new(Filter::eq("title", "missing"), doc! { "views": 1 }))
        .await
        .unwrap();
    assert_eq!(missing, None);

    mapper.destroy().await.unwrap();
}

#[tokio::test]
async fn test_remove_deletes_one_match() {
    let driver = InMemoryDriver::new();
    let mut mapper = seeded_mapper(&driver).await;

    mapper
        .remove(QueryOptions::filter(Filter::eq("views", 3)))
        .await
        .unwrap();
    mapper
        .remove(QueryOptions::filter(Filter::eq("title", "missing")))
        .await
        .unwrap();

    let documents = mapper.find(QueryOptions::default()).await.unwrap();
    assert_eq!(titles(&documents), vec!["intro", "usage", "faq"]);

    mapper.destroy().await.unwrap();
}

#[tokio::test]
async fn test_mappers_share_a_driver() {
    let driver = InMemoryDriver::new();
    let mut writer = seeded_mapper(&driver).await;
    let mut reader = memory_mapper(&driver);
    reader.initialize().await.unwrap();

    let count = reader.find(QueryOptions::default()).await.unwrap().len();
    assert_eq!(count, 4);

    writer.destroy().await.unwrap();
    reader.destroy().await.unwrap();
}

#[tokio::test]
async fn test_find_sorts_nan_below_numbers() {
    let driver = InMemoryDriver::new();
    let mut mapper = memory_mapper(&driver);
    mapper.initialize().await.unwrap();

    for n in 0..40 {
        let document = if n % 4 == 0 { doc! { "v": f64::NAN, "n": n } } else { doc! { "v": n, "n": n } };
        mapper.create(document).await.unwrap();
    }

    let sorted = mapper
        .find(QueryOptions::builder().sort("v", SortDirection::Asc).build())
        .await
        .unwrap();

    assert_eq!(sorted.len(), 40);
    let (nans, numbers) = sorted.split_at(10);
    assert!(nans.iter().all(|document| document.get_f64("v").is_ok_and(f64::is_nan)));
    let values: Vec<i32> = numbers.iter().map(|document| document.get_i32("v").unwrap()).collect();
    assert!(values.windows(2).all(|pair| pair[0] < pair[1]));

    let highest = mapper
        .find_one(QueryOptions::builder().sort("v", SortDirection::Desc).build())
        .await
        .unwrap();
    assert_eq!(highest, Some(doc! { "v": 39, "n": 39 }));

    mapper.destroy().await.unwrap();
}

#[tokio::test]
async fn test_update_sets_nested_fields() {
    let driver = InMemoryDriver::new();
    let mut mapper = memory_mapper(&driver);
    mapper.initialize().await.unwrap();
    mapper
        .create(doc! { "title": "intro", "meta": { "author": "ann", "draft": true } })
        .await
        .unwrap();

    let updated = mapper
        .update(UpdateOptions::new(Filter::eq("title", "intro"), doc! { "meta.draft": false }))
        .await
        .unwrap();

    assert_eq!(
        updated,
        Some(doc! { "title": "intro", "meta": { "author": "ann", "draft": false } })
    );

    let err = mapper
        .update(UpdateOptions::new(Filter::eq("title", "intro"), doc! {}))
        .await
        .unwrap_err();
    assert!(matches!(err, DataMapperError::Operation(_)));

    mapper.destroy().await.unwrap();
}

#[cfg(feature = "mongodb")]
#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn test_mongodb_lifecycle() {
    let mut mapper = create_data_mapper(
        MapperOptions::from_json(r#"{ "connectionUri": "mongodb://localhost/test", "collectionName": "docs" }"#)
            .unwrap(),
    )
    .unwrap();

    mapper.initialize().await.unwrap();
    assert!(mapper.is_initialized());

    mapper.destroy().await.unwrap();
    assert!(!mapper.is_initialized());
}

#[cfg(feature = "mongodb")]
#[tokio::test]
#[ignore = "requires a running MongoDB server"]
async fn test_mongodb_crud() {
    let mut mapper = create_data_mapper(
        MapperOptions::builder()
            .connection_uri(CONNECTION_URI)
            .collection_name("docmapper_crud")
            .transform(strip_id)
            .build(),
    )
    .unwrap();
    mapper.initialize().await.unwrap();

    mapper.create(doc! { "title": "mongo", "views": 1 }).await.unwrap();

    let updated = mapper
        .update(UpdateOptions::new(Filter::eq("title", "mongo"), doc! { "views": 2 }))
        .await
        .unwrap();
    assert_eq!(updated, Some(doc! { "title": "mongo", "views": 2 }));

    mapper.remove(QueryOptions::filter(Filter::eq("title", "mongo"))).await.unwrap();
    let remaining = mapper
        .find_one(QueryOptions::filter(Filter::eq("title", "mongo")))
        .await
        .unwrap();
    assert_eq!(remaining, None);

    mapper.destroy().await.unwrap();
}
