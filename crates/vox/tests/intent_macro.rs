use serde_json::json;
use vox::prelude::*;

#[intent("GREET")]
async fn greet(name: String, r#type: Option<String>) -> String {
    match r#type {
        Some(kind) => format!("Hello, {kind} {name}!"),
        None => format!("Hello, {name}!"),
    }
}

#[intent("COUNTDOWN", silent = false)]
fn countdown(from: i64) -> String {
    (0..=from).rev().map(|n| n.to_string()).collect::<Vec<_>>().join(" ")
}

async fn ask_again(parameter: String, _error: ConversionError) -> Response {
    Response::ask(format!("Sorry, what {parameter} did you mean?"))
}

#[intent("REMIND", error_handler = ask_again)]
async fn remind(date: NaiveDate, amount: AttributeV2<i64>) -> String {
    format!("{} reminders on {date}", amount.value)
}

fn skill() -> Skill {
    Skill::builder()
        .config(Default::default())
        .init_logging(false)
        .collect_registered()
        .build()
        .unwrap()
}

fn request(context: Context) -> InvokeRequest {
    InvokeRequest::new(context, Session::new("test"))
}

#[tokio::test]
async fn test_collected_intents() {
    assert_eq!(skill().intent_names(), vec!["COUNTDOWN", "GREET", "REMIND"]);
}

#[tokio::test]
async fn test_raw_identifier_parameter() {
    let skill = skill();

    let context = Context::new("GREET")
        .with_attribute("name", ["Ada"])
        .with_attribute("type", ["Dr."]);
    let response = skill.handle(request(context)).await.unwrap();
    assert_eq!(response.text, "Hello, Dr. Ada!");

    let context = Context::new("GREET").with_attribute("name", ["Ada"]);
    let response = skill.handle(request(context)).await.unwrap();
    assert_eq!(response, Response::tell("Hello, Ada!"));
}

#[tokio::test]
async fn test_blocking_strict_intent() {
    let skill = skill();
    let intent = skill.registry().get("COUNTDOWN").unwrap();
    assert_eq!(intent.handler().kind().to_string(), "blocking");

    let context = Context::new("COUNTDOWN").with_attribute("from", ["3"]);
    let response = skill.handle(request(context)).await.unwrap();
    assert_eq!(response.text, "3 2 1 0");

    let context = Context::new("COUNTDOWN").with_attribute("from", ["three"]);
    let error = skill.handle(request(context)).await.unwrap_err();
    assert!(matches!(
        error.as_invoke(),
        Some(InvokeError::Conversion { parameter, .. }) if parameter == "from"
    ));
}

#[tokio::test]
async fn test_error_handler_routing() {
    let skill = skill();
    let amount = AttributeV2::<serde_json::Value>::from_value(json!({"id": 4, "value": "2"}))
        .unwrap();

    let context = Context::new("REMIND")
        .with_attribute("date", ["2024-02-29"])
        .with_attribute_v2("amount", [amount.clone()]);
    let response = skill.handle(request(context)).await.unwrap();
    assert_eq!(response.text, "2 reminders on 2024-02-29");

    let context = Context::new("REMIND")
        .with_attribute("date", ["someday"])
        .with_attribute_v2("amount", [amount]);
    let response = skill.handle(request(context)).await.unwrap();
    assert_eq!(response.kind, ResponseType::Ask);
    assert_eq!(response.text, "Sorry, what date did you mean?");
}

#[tokio::test]
async fn test_functions_stay_callable() {
    assert_eq!(greet("Bob".to_string(), None).await, "Hello, Bob!");
    assert_eq!(countdown(1), "1 0");
}
