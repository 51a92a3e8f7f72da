use std::sync::Arc;

use encoded::{DocumentError, DynamicDocument, EncodeError, EncoderInput, Field, Schema, encoder};
use serde_json::{Value, json};

fn upper() -> impl encoded::Encoder {
    encoder::from_fn(|value: &Value| {
        value
            .as_str()
            .map(|s| Value::from(s.to_uppercase()))
            .ok_or_else(|| EncodeError::unsupported("string", value))
    })
}

fn base_schema() -> anyhow::Result<Arc<Schema>> {
    let schema = Schema::builder("Base")
        .field("id", Field::new())
        .field("text", Field::new().with_encoder(upper()))
        .build()?;
    Ok(Arc::new(schema))
}

#[test]
fn child_schema_inherits_base_fields_first() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let base = base_schema()?;
    let child = Arc::new(
        Schema::builder("Child")
            .extends(&base)
            .field("note", Field::new().allow_none(true))
            .build()?,
    );

    assert_eq!(child.field_names(), vec!["id", "text", "note"]);
    assert!(Arc::ptr_eq(
        &child.shared_field("text").expect("inherited"),
        &base.shared_field("text").expect("declared")
    ));

    let mut doc = DynamicDocument::new(&child, [("id", json!(1)), ("text", json!("inherited"))])?;
    doc.encode()?;
    assert_eq!(doc.get_field("text")?.encoded_value(), Some(&json!("INHERITED")));
    assert!(doc.get_field("note")?.is_null());
    Ok(())
}

#[test]
fn redeclared_field_overrides_inherited_one() -> anyhow::Result<()> {
    let base = base_schema()?;
    let child = Arc::new(
        Schema::builder("Plain")
            .extends(&base)
            .field("text", Field::new().allow_none(true))
            .build()?,
    );

    assert_eq!(child.field_names(), vec!["id", "text"]);
    assert!(!child.field("text").expect("redeclared").is_encodeable());

    let mut doc = DynamicDocument::new(&child, [("id", 1)])?;
    doc.encode()?;
    assert!(!doc.get_field("text")?.is_encoded());
    Ok(())
}

#[test]
fn batch_encode_is_all_or_nothing() -> anyhow::Result<()> {
    let base = base_schema()?;
    let mut docs = DynamicDocument::batch_create(
        &base,
        [("id", vec![json!(1), json!(2)]), ("text", vec![json!("ok"), json!(7)])],
    )?;

    let err = DynamicDocument::batch_encode(&mut docs).err().expect("second value is not a string");
    assert!(matches!(err, DocumentError::Encoder { ref field, .. } if field == "text"));
    assert!(docs.iter().all(|doc| doc.get_field("text").is_ok_and(|fv| !fv.is_encoded())));
    Ok(())
}

#[test]
fn encoder_input_writes_encode_immediately() -> anyhow::Result<()> {
    let base = base_schema()?;
    let mut doc = DynamicDocument::new(&base, [("id", json!(3)), ("text", json!("raw"))])?;

    doc.set_field("text", EncoderInput::new("fresh"))?;
    assert_eq!(doc.get_field("text")?.value(), &json!("fresh"));
    assert_eq!(doc.get_field("text")?.encoded_value(), Some(&json!("FRESH")));

    let err = doc.set_field("id", EncoderInput::new(4)).err().expect("id has no encoder");
    assert!(matches!(err, DocumentError::EncoderNotConfigured { ref field, .. } if field == "id"));
    assert_eq!(doc.get_field("id")?.value(), &json!(3));
    Ok(())
}

#[test]
fn declaration_problems_are_collected() {
    let err = Schema::builder("Broken")
        .field("text", Field::new())
        .field("text", Field::new())
        .field("_hidden", Field::new())
        .build()
        .err()
        .expect("declaration is invalid");

    assert_eq!(err.document, "Broken");
    assert!(err.find("duplicate_field").is_some());
    assert!(err.find("invalid_name").is_some());
}

#[test]
fn null_encodings_read_as_unencoded() -> anyhow::Result<()> {
    let schema = Arc::new(
        Schema::builder("Blank")
            .field("text", Field::new().with_encoder(encoder::from_fn(|_: &Value| Ok(Value::Null))))
            .build()?,
    );
    let mut docs = DynamicDocument::batch_create(&schema, [("text", vec!["a", "b"])])?;
    DynamicDocument::batch_encode(&mut docs)?;
    docs[1].encode()?;

    for doc in &docs {
        let text = doc.get_field("text")?;
        assert!(!text.is_encoded());
        let round_trip: encoded::FieldValue = serde_json::from_value(serde_json::to_value(text)?)?;
        assert_eq!(&round_trip, text);
    }
    assert_eq!(docs[0].to_json(), json!({ "text": { "value": "a", "encoded_value": null } }));
    Ok(())
}
