//! Builds a few articles from columns, encodes them in one batch and prints
//! the result. Run with `RUST_LOG=debug` to see what the library does.

use encoded::{Document, EncodeError, Encoder, FieldValue, registered_documents};
use serde_json::Value;

#[derive(Document)]
struct Article {
    id: FieldValue,
    #[field(encoder = Shout)]
    text: FieldValue,
    #[field(allow_none)]
    tag: FieldValue,
}

struct Shout;

impl Encoder for Shout {
    fn encode_one(&self, value: &Value) -> Result<Value, EncodeError> {
        value
            .as_str()
            .map(|s| Value::from(s.to_uppercase()))
            .ok_or_else(|| EncodeError::unsupported("string", value))
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    for registration in registered_documents() {
        println!("{} -> {:?}", registration.type_name, registration.schema());
    }

    let mut articles = Article::batch_create([
        ("id", vec![Value::from(1), Value::from(2), Value::from(3)]),
        ("text", vec!["a".into(), "b".into(), "c".into()]),
    ])?;
    Article::batch_encode(&mut articles)?;

    for article in &articles {
        println!("{}: {}", article.id(), article.text());
    }

    let mut single = Article::new([("id", Value::from(4)), ("text", Value::from("hello how"))])?;
    single.encode()?;
    println!("{}", serde_json::to_string_pretty(&single.to_json())?);
    Ok(())
}
