use super::*;

#[test]
fn backend_message_becomes_api_error() {
    let body: BackendErrorBody =
        serde_json::from_str(r#"{"message":"category not found"}"#).expect("body");
    let error = body.into_api_error(404);
    assert_eq!(error.code, ErrorCode::NotFound);
    assert_eq!(error.to_string(), "NotFound: category not found");
}

#[test]
fn missing_message_falls_back_to_status() {
    let error = BackendErrorBody::default().into_api_error(503);
    assert_eq!(error.code, ErrorCode::Unavailable);
    assert_eq!(error.message, "request failed with status 503");
}
