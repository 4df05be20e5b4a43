use std::sync::{Arc, Mutex};

use courier::http::capture::CaptureSink;
use courier::http::response::{reconstruct, serialize, Response};
use courier::http::sink::ResponseSink;
use courier::http::status::StatusCode;
use courier::http::writer::serialize_head;

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::OK.as_u16(), 200);
    assert_eq!(StatusCode::CREATED.as_u16(), 201);
    assert_eq!(StatusCode::NO_CONTENT.as_u16(), 204);
    assert_eq!(StatusCode::BAD_REQUEST.as_u16(), 400);
    assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
    assert_eq!(StatusCode::from_u16(418).as_u16(), 418);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::OK.reason_phrase(), "OK");
    assert_eq!(StatusCode::ACCEPTED.reason_phrase(), "Accepted");
    assert_eq!(
        StatusCode::INTERNAL_SERVER_ERROR.reason_phrase(),
        "Internal Server Error"
    );
    assert_eq!(StatusCode::from_u16(599).reason_phrase(), "");
    assert_eq!(StatusCode::NOT_FOUND.to_string(), "404 Not Found");
}

#[test]
fn test_setters() {
    let mut response = Response::without_body();
    assert_eq!(response.status(), StatusCode::OK);

    response.set_status(StatusCode::NOT_FOUND);
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    response.set_header("X-Foo", "bar");
    assert_eq!(response.header("X-Foo"), Some("bar"));
    response.set_header("X-Foo", "baz");
    assert_eq!(response.header("X-Foo"), Some("baz"));

    response.add_header("X-Foo", "bonk");
    assert_eq!(response.header("X-Foo"), Some("baz"));
    assert_eq!(response.header("x-foo"), Some("baz"));
    assert_eq!(response.header("X-Missing"), None);
}

#[test]
fn test_setters_chain() {
    let mut response = Response::without_body();
    response
        .set_status(StatusCode::CREATED)
        .set_header("Location", "/items/1")
        .add_header("Vary", "Origin")
        .add_header("Vary", "Accept");

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get_all("Vary"), ["Origin", "Accept"]);
}

#[test]
fn test_set_header_empty_value_removes() {
    let mut response = Response::without_body();
    response.add_header("X-Foo", "a").add_header("X-Foo", "b");
    response.set_header("X-Foo", "");

    assert_eq!(response.header("X-Foo"), None);
    assert!(!response.headers().contains_key("X-Foo"));
}

#[tokio::test]
async fn test_headers_written_in_order() {
    let mut response = Response::without_body();
    response
        .set_header("X-Foo", "baz")
        .add_header("X-Foo", "bonk")
        .add_header("X-Bar", "one");

    let mut sink = CaptureSink::new(0);
    response.write_to(&mut sink).await;

    assert_eq!(sink.headers().get_all("X-Foo"), ["baz", "bonk"]);
    let names: Vec<&str> = sink.headers().iter().map(|(k, _)| k).collect();
    assert_eq!(names, ["X-Foo", "X-Bar"]);
}

#[tokio::test]
async fn test_write_to_commits_status() {
    let mut response = Response::without_body();
    response.set_status(StatusCode::ACCEPTED);

    let mut sink = CaptureSink::new(0);
    response.write_to(&mut sink).await;

    assert_eq!(sink.status, Some(StatusCode::ACCEPTED));
    assert!(sink.body.is_empty());
    assert!(response.is_written());
}

#[tokio::test]
async fn test_write_to_trait_object_sink() {
    let mut response = Response::respond("through a trait object");
    response.set_status(StatusCode::CREATED);

    let mut capture = CaptureSink::new(4);
    let sink: &mut dyn ResponseSink = &mut capture;
    response.write_to(sink).await;

    assert_eq!(capture.status, Some(StatusCode::CREATED));
    assert_eq!(capture.headers().get("Content-Length"), Some("22"));
    assert_eq!(capture.body, b"through a trait object");
}

#[tokio::test]
#[should_panic(expected = "response was already written")]
async fn test_multiple_write_to_calls_panic() {
    let mut response = Response::respond("{}");

    // This one is fine
    response.write_to(&mut CaptureSink::new(0)).await;

    // This one is not
    response.write_to(&mut CaptureSink::new(0)).await;
}

#[tokio::test]
async fn test_callbacks_run_in_order() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut response = Response::respond("hello");

    for id in 1..=3 {
        let calls = Arc::clone(&calls);
        response.add_callback(move |err| calls.lock().unwrap().push((id, err.is_none())));
    }

    response.write_to(&mut CaptureSink::new(0)).await;

    assert_eq!(*calls.lock().unwrap(), [(1, true), (2, true), (3, true)]);
}

#[tokio::test]
async fn test_respond() {
    let data1 = vec![1u8, 3, 5, 7, 9];
    let data2 = vec![2u8, 4, 6, 8, 0];

    let (sink1, result1) = serialize(Response::respond(data1.clone())).await;
    let (sink2, result2) = serialize(Response::respond(data2.clone())).await;

    assert!(result1.is_ok());
    assert!(result2.is_ok());
    assert_eq!(sink1.status, Some(StatusCode::OK));
    assert_eq!(sink1.body, data1);
    assert_eq!(sink2.body, data2);
    assert_eq!(sink1.headers().get("Content-Length"), Some("5"));
}

#[tokio::test]
async fn test_respond_partial_writes() {
    let data: Vec<u8> = (0..=255).collect();
    let mut response = Response::respond(data.clone());

    let mut sink = CaptureSink::new(10);
    response.write_to(&mut sink).await;

    assert_eq!(sink.body, data);
    assert_eq!(sink.num_writes, 26);
}

#[tokio::test]
async fn test_empty() {
    let response = Response::empty(StatusCode::NO_CONTENT);
    assert_eq!(response.header("Content-Length"), Some("0"));

    let (sink, result) = serialize(response).await;

    assert!(result.is_ok());
    assert_eq!(sink.status, Some(StatusCode::NO_CONTENT));
    assert!(sink.body.is_empty());
}

#[tokio::test]
async fn test_round_trip_serialize() {
    let mut response1 = Response::respond(r#"{"foo":[1,2,3]}"#);
    response1
        .set_status(StatusCode::ACCEPTED)
        .set_header("Content-Type", "application/json")
        .add_header("foo", "bar")
        .add_header("foo", "baz")
        .add_header("bar", "bonk");
    let status1 = response1.status();

    let (sink1, result) = serialize(response1).await;
    assert!(result.is_ok());

    let response2 = reconstruct(sink1.status_or_default(), sink1.headers(), sink1.body.clone());
    assert_eq!(response2.status(), status1);

    let (sink2, result) = serialize(response2).await;
    assert!(result.is_ok());

    assert_eq!(sink1.headers(), sink2.headers());
    assert_eq!(sink1.body, sink2.body);
    assert_eq!(
        serialize_head(sink1.status_or_default(), sink1.headers()),
        serialize_head(sink2.status_or_default(), sink2.headers())
    );
}

#[tokio::test]
async fn test_reconstruct_keeps_missing_content_length_missing() {
    let mut response = Response::new(courier::http::response::Full::new("streamed"));
    response.set_header("X-Origin", "stream");

    let (sink1, _) = serialize(response).await;
    let (sink2, _) = serialize(reconstruct(StatusCode::OK, sink1.headers(), sink1.body.clone())).await;

    assert_eq!(sink2.headers().get("Content-Length"), None);
    assert_eq!(sink1.headers(), sink2.headers());
}
